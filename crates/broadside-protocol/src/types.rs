//! Core protocol types for Broadside's wire format.
//!
//! Every message on the wire is a single UTF-8 JSON object, internally
//! tagged with a `type` field — `{"type": "attack", "x": 3, "y": 7}`.
//! There is no batching and no fragmentation: one JSON object per
//! WebSocket text frame.
//!
//! The tag names are snake_case and match what the browser client sends
//! and expects, so messages can be inspected as-is in DevTools.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable user identity, as resolved by the [`Authenticator`] at
/// connection time.
///
/// Newtype over the username string. `#[serde(transparent)]` makes it
/// serialize as a plain JSON string, which is what the client expects in
/// fields like `players`, `attacker`, and `winner`.
///
/// [`Authenticator`]: https://docs.rs/broadside-session
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A room's shareable join code: short, alphanumeric, case-insensitive.
///
/// The code is normalized to ASCII uppercase on every construction path
/// (including deserialization, which is hand-written for exactly that
/// reason), so `"abc123"` and `"ABC123"` address the same room and the
/// registry can key rooms by the code directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a room code, normalizing to uppercase.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_ascii_uppercase())
    }

    /// Returns the normalized code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

// ---------------------------------------------------------------------------
// Board vocabulary shared with the game layer
// ---------------------------------------------------------------------------

/// A grid coordinate. `(0,0)` is the top-left corner; `x` grows to the
/// right, `y` grows downward. Valid cells are `[0,9] × [0,9]` — bounds
/// are enforced by the game layer, not by deserialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    /// Creates a coordinate.
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The five canonical ship types. Exactly one of each per fleet.
///
/// Wire names are the capitalized English names (`"Carrier"`, …) — these
/// are the map keys the client sends in `place_ships` and the value of
/// `sunk_ship` in `attack_result`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    /// All five kinds, in descending size order.
    pub const ALL: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    /// The ship's length in cells.
    pub fn size(self) -> u8 {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    /// The wire/display name.
    pub fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "Carrier",
            ShipKind::Battleship => "Battleship",
            ShipKind::Cruiser => "Cruiser",
            ShipKind::Submarine => "Submarine",
            ShipKind::Destroyer => "Destroyer",
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A full fleet submission: ship kind → ordered coordinate list.
///
/// `BTreeMap` keeps iteration order deterministic, which keeps placement
/// validation (and its error reporting) reproducible.
pub type ShipsSpec = BTreeMap<ShipKind, Vec<Coord>>;

// ---------------------------------------------------------------------------
// Recipient — who should receive an outbound event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Game logic returns `(Recipient, ServerMessage)` pairs; the room actor
/// resolves each recipient against the attached connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every participant in the room.
    All,
    /// One specific participant.
    Player(UserId),
    /// Everyone except the given participant.
    AllExcept(UserId),
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces the flat
/// internally-tagged shape the client speaks:
/// `{"type": "join_room", "room_code": "ABC123"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room; the sender becomes its first participant.
    CreateRoom,

    /// Join an existing room by code (case-insensitive).
    JoinRoom { room_code: RoomCode },

    /// Submit the complete fleet. All five ship kinds must be present;
    /// each value is the ship's ordered coordinate list.
    PlaceShips { ships: ShipsSpec },

    /// Fire at the opponent's board. Only legal for the turn owner.
    Attack { x: u8, y: u8 },

    /// Send a chat line to the room.
    Chat { message: String },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Events the server emits.
///
/// Delivery per event is decided by the room/handler layer (unicast vs
/// room broadcast); the wire shape is the same flat tagged JSON as
/// [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Unicast to the creator: the room is open at this code.
    RoomCreated { room_code: RoomCode },

    /// Broadcast: the room's membership after a successful join.
    PlayerJoined { players: Vec<UserId> },

    /// Broadcast: a participant's fleet is committed; waiting on the other.
    PlayerReady { player: UserId },

    /// Broadcast: both fleets are in; `current_turn` fires first.
    GameStart { current_turn: UserId },

    /// Broadcast: outcome of one resolved attack.
    AttackResult {
        attacker: UserId,
        x: u8,
        y: u8,
        hit: bool,
        sunk_ship: Option<ShipKind>,
        current_turn: UserId,
    },

    /// Broadcast: the match is over. Fires exactly once per room.
    GameOver { winner: UserId },

    /// Broadcast: a relayed chat line (echoed to the sender too).
    Chat { username: UserId, message: String },

    /// Unicast to the offender: a rejected operation. Never fatal to the
    /// connection.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is a compatibility contract with the browser
    //! client; these tests pin the exact JSON shapes.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId::from("bob").to_string(), "bob");
    }

    #[test]
    fn test_room_code_normalizes_to_uppercase() {
        assert_eq!(RoomCode::new("abc123").as_str(), "ABC123");
        assert_eq!(RoomCode::new("ABC123"), RoomCode::new("abc123"));
    }

    #[test]
    fn test_room_code_deserialize_normalizes() {
        let code: RoomCode = serde_json::from_str("\"ab12cd\"").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomCode::new("XY99ZZ")).unwrap();
        assert_eq!(json, "\"XY99ZZ\"");
    }

    // =====================================================================
    // ShipKind
    // =====================================================================

    #[test]
    fn test_ship_kind_sizes_match_canonical_set() {
        assert_eq!(ShipKind::Carrier.size(), 5);
        assert_eq!(ShipKind::Battleship.size(), 4);
        assert_eq!(ShipKind::Cruiser.size(), 3);
        assert_eq!(ShipKind::Submarine.size(), 3);
        assert_eq!(ShipKind::Destroyer.size(), 2);
    }

    #[test]
    fn test_ship_kind_wire_name_is_capitalized() {
        let json = serde_json::to_string(&ShipKind::Carrier).unwrap();
        assert_eq!(json, "\"Carrier\"");
        let back: ShipKind = serde_json::from_str("\"Destroyer\"").unwrap();
        assert_eq!(back, ShipKind::Destroyer);
    }

    #[test]
    fn test_ship_kind_all_has_five_distinct_kinds() {
        let mut kinds = ShipKind::ALL.to_vec();
        kinds.dedup();
        assert_eq!(kinds.len(), 5);
        let total: u8 = ShipKind::ALL.iter().map(|k| k.size()).sum();
        assert_eq!(total, 17);
    }

    #[test]
    fn test_ship_kind_works_as_json_map_key() {
        // `place_ships` uses ship names as object keys.
        let mut ships = ShipsSpec::new();
        ships.insert(ShipKind::Destroyer, vec![Coord::new(0, 0), Coord::new(1, 0)]);
        let json: serde_json::Value = serde_json::to_value(&ships).unwrap();
        assert_eq!(json["Destroyer"][0]["x"], 0);
        assert_eq!(json["Destroyer"][1]["x"], 1);
    }

    // =====================================================================
    // ClientMessage — exact tag names per variant
    // =====================================================================

    #[test]
    fn test_client_message_create_room_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(&ClientMessage::CreateRoom).unwrap();
        assert_eq!(json["type"], "create_room");
    }

    #[test]
    fn test_client_message_join_room_json_format() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type": "join_room", "room_code": "ab12cd"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_code: RoomCode::new("AB12CD")
            }
        );
    }

    #[test]
    fn test_client_message_attack_json_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "attack", "x": 3, "y": 7}"#)
                .unwrap();
        assert_eq!(msg, ClientMessage::Attack { x: 3, y: 7 });
    }

    #[test]
    fn test_client_message_place_ships_round_trip() {
        let mut ships = ShipsSpec::new();
        ships.insert(
            ShipKind::Destroyer,
            vec![Coord::new(5, 5), Coord::new(5, 6)],
        );
        let msg = ClientMessage::PlaceShips { ships };
        let text = serde_json::to_string(&msg).unwrap();
        let back: ClientMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_client_message_chat_round_trip() {
        let msg = ClientMessage::Chat {
            message: "gg".into(),
        };
        let text = serde_json::to_string(&msg).unwrap();
        let back: ClientMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg, back);
    }

    // =====================================================================
    // ServerMessage — exact shapes the client parses
    // =====================================================================

    #[test]
    fn test_server_message_room_created_json_format() {
        let msg = ServerMessage::RoomCreated {
            room_code: RoomCode::new("AB12CD"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "room_created");
        assert_eq!(json["room_code"], "AB12CD");
    }

    #[test]
    fn test_server_message_player_joined_json_format() {
        let msg = ServerMessage::PlayerJoined {
            players: vec![UserId::from("alice"), UserId::from("bob")],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "player_joined");
        assert_eq!(json["players"], serde_json::json!(["alice", "bob"]));
    }

    #[test]
    fn test_server_message_attack_result_json_format() {
        let msg = ServerMessage::AttackResult {
            attacker: UserId::from("alice"),
            x: 5,
            y: 6,
            hit: true,
            sunk_ship: Some(ShipKind::Destroyer),
            current_turn: UserId::from("bob"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "attack_result");
        assert_eq!(json["attacker"], "alice");
        assert_eq!(json["hit"], true);
        assert_eq!(json["sunk_ship"], "Destroyer");
        assert_eq!(json["current_turn"], "bob");
    }

    #[test]
    fn test_server_message_attack_result_miss_has_null_sunk_ship() {
        let msg = ServerMessage::AttackResult {
            attacker: UserId::from("alice"),
            x: 0,
            y: 0,
            hit: false,
            sunk_ship: None,
            current_turn: UserId::from("bob"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert!(json["sunk_ship"].is_null());
    }

    #[test]
    fn test_server_message_game_over_json_format() {
        let msg = ServerMessage::GameOver {
            winner: UserId::from("alice"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "game_over");
        assert_eq!(json["winner"], "alice");
    }

    #[test]
    fn test_server_message_error_json_format() {
        let msg = ServerMessage::Error {
            message: "not your turn".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "not your turn");
    }

    #[test]
    fn test_server_message_chat_round_trip() {
        let msg = ServerMessage::Chat {
            username: UserId::from("alice"),
            message: "hello".into(),
        };
        let text = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg, back);
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_type_tag_returns_error() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type": "fly_to_moon", "speed": 9000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_required_field_returns_error() {
        // join_room without room_code.
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type": "join_room"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_ship_name_returns_error() {
        let result: Result<ClientMessage, _> = serde_json::from_str(
            r#"{"type": "place_ships", "ships": {"Dinghy": [{"x":0,"y":0}]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_negative_coordinate_returns_error() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type": "attack", "x": -1, "y": 0}"#);
        assert!(result.is_err());
    }
}
