//! # Broadside
//!
//! An authoritative server for two-player, turn-based naval combat over
//! persistent WebSocket connections.
//!
//! Clients are thin mirrors: they report intent (`place_ships`,
//! `attack`) and render what the server says happened. Boards, turn
//! order, hit/miss resolution, and win detection all live server-side,
//! one actor task per room, so two racing connections can never
//! disagree about a match.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use broadside::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BroadsideError> {
//!     let server = BroadsideServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(InsecureAuth, NullHistory)
//!         .await?;
//!     server.run().await
//! }
//! ```
//!
//! Clients connect to `ws://host:port/ws/{token}` and exchange one JSON
//! object per text frame, tagged by `type` (`create_room`, `join_room`,
//! `place_ships`, `attack`, `chat` inbound; `room_created`,
//! `player_joined`, `player_ready`, `game_start`, `attack_result`,
//! `game_over`, `chat`, `error` outbound).

mod error;
mod handler;
mod server;

pub use error::BroadsideError;
pub use server::{BroadsideServer, BroadsideServerBuilder};

/// The common imports for running or embedding a Broadside server.
pub mod prelude {
    pub use crate::{BroadsideError, BroadsideServer, BroadsideServerBuilder};

    pub use broadside_game::{
        Board, GameSession, Phase, PlayerCommand, GRID_SIZE,
    };
    pub use broadside_protocol::{
        ClientMessage, Codec, Coord, JsonCodec, Recipient, RoomCode,
        ServerMessage, ShipKind, ShipsSpec, UserId,
    };
    pub use broadside_room::{
        HistorySink, MatchRecord, MemoryHistory, NullHistory, RoomConfig,
        RoomError,
    };
    pub use broadside_session::{
        Authenticator, InsecureAuth, SessionConfig, SessionError,
    };
}
