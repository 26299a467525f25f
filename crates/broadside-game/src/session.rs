//! The per-room session state machine.
//!
//! [`GameSession`] owns everything that makes one match: both
//! participants' boards, the phase, and the turn owner. It is pure
//! state — no I/O, no clocks beyond duration bookkeeping, no async.
//! The room actor drives it and dispatches the `(Recipient,
//! ServerMessage)` event lists it returns; every mutation happens
//! through exactly one of its methods, which is what keeps the
//! single-writer invariant trivial to uphold.

use std::time::{Duration, Instant};

use broadside_protocol::{
    Coord, Recipient, ServerMessage, ShipsSpec, ShipKind, UserId,
};

use crate::board::{Board, Placement};
use crate::resolver::resolve_attack;
use crate::{GameError, PlacementError};

/// Outbound events produced by a state transition, each paired with who
/// should receive it.
pub type Events = Vec<(Recipient, ServerMessage)>;

/// The room's stage in the match lifecycle.
///
/// ```text
/// Placement → Ready → Playing → Finished
/// ```
///
/// `Ready` is the instant between "both fleets committed" and "turn
/// assigned"; the transition that observes both-ready assigns the turn
/// in the same call, so external observers only ever see `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Placement,
    Ready,
    Playing,
    Finished,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Placement => write!(f, "Placement"),
            Phase::Ready => write!(f, "Ready"),
            Phase::Playing => write!(f, "Playing"),
            Phase::Finished => write!(f, "Finished"),
        }
    }
}

/// One player's slot in the session.
#[derive(Debug, Clone)]
pub struct Participant {
    user: UserId,
    board: Board,
    ready: bool,
    connected: bool,
}

impl Participant {
    fn new(user: UserId) -> Self {
        Self {
            user,
            board: Board::new(),
            ready: false,
            connected: true,
        }
    }

    /// The participant's identity.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Their board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whether their fleet is committed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a live connection is currently attached.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// An in-room command from a participant, as routed by the handler.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    PlaceShips(ShipsSpec),
    Attack(Coord),
    Chat(String),
}

/// The authoritative state of one match.
pub struct GameSession {
    /// Creator first. Never more than two.
    players: Vec<Participant>,
    phase: Phase,
    turn: Option<UserId>,
    winner: Option<UserId>,
    created_at: Instant,
    started_at: Option<Instant>,
    /// Fixed at the Finished transition.
    duration: Option<Duration>,
}

impl GameSession {
    /// Opens a session with the room creator as its first participant.
    pub fn new(creator: UserId) -> Self {
        Self {
            players: vec![Participant::new(creator)],
            phase: Phase::Placement,
            turn: None,
            winner: None,
            created_at: Instant::now(),
            started_at: None,
            duration: None,
        }
    }

    // -- Accessors ---------------------------------------------------------

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The participant allowed to attack, once `Playing`.
    pub fn turn_owner(&self) -> Option<&UserId> {
        self.turn.as_ref()
    }

    /// The winner, once `Finished`.
    pub fn winner(&self) -> Option<&UserId> {
        self.winner.as_ref()
    }

    /// Both participants, creator first.
    pub fn participants(&self) -> &[Participant] {
        &self.players
    }

    /// The room creator.
    pub fn creator(&self) -> &UserId {
        &self.players[0].user
    }

    /// `true` if the user is a participant.
    pub fn contains(&self, user: &UserId) -> bool {
        self.index_of(user).is_some()
    }

    /// Participants with a live connection attached.
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// When the room was opened.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Wall-clock length of the match, fixed when it finished.
    pub fn match_duration(&self) -> Option<Duration> {
        self.duration
    }

    fn index_of(&self, user: &UserId) -> Option<usize> {
        self.players.iter().position(|p| &p.user == user)
    }

    fn roster(&self) -> Vec<UserId> {
        self.players.iter().map(|p| p.user.clone()).collect()
    }

    // -- Membership --------------------------------------------------------

    /// Adds the second participant.
    ///
    /// # Errors
    /// [`GameError::AlreadyJoined`] for a duplicate join,
    /// [`GameError::MatchFull`] past two participants.
    pub fn join(&mut self, user: UserId) -> Result<Events, GameError> {
        if self.contains(&user) {
            return Err(GameError::AlreadyJoined(user));
        }
        if self.players.len() >= 2 {
            return Err(GameError::MatchFull);
        }
        self.players.push(Participant::new(user));
        Ok(vec![(
            Recipient::All,
            ServerMessage::PlayerJoined {
                players: self.roster(),
            },
        )])
    }

    // -- Command dispatch --------------------------------------------------

    /// Applies one in-room command from `user`.
    pub fn apply(
        &mut self,
        user: &UserId,
        command: PlayerCommand,
    ) -> Result<Events, GameError> {
        match command {
            PlayerCommand::PlaceShips(ships) => self.place_ships(user, &ships),
            PlayerCommand::Attack(target) => self.attack(user, target),
            PlayerCommand::Chat(message) => self.chat(user, message),
        }
    }

    /// Commits a participant's complete fleet.
    ///
    /// The submission is validated onto a fresh candidate board; only a
    /// fully legal fleet is installed, so a rejected submission leaves
    /// the participant exactly as before. Once both fleets are in, the
    /// session passes through `Ready`, assigns the first turn to the
    /// room creator, and lands in `Playing`.
    fn place_ships(
        &mut self,
        user: &UserId,
        ships: &ShipsSpec,
    ) -> Result<Events, GameError> {
        let idx = self
            .index_of(user)
            .ok_or_else(|| GameError::NotAParticipant(user.clone()))?;

        if self.phase == Phase::Finished {
            return Err(GameError::MatchOver);
        }
        // A readiness-confirmed fleet is immutable.
        if self.players[idx].ready {
            return Err(GameError::ShipsCommitted);
        }

        let mut board = Board::new();
        for kind in ShipKind::ALL {
            let cells = ships
                .get(&kind)
                .ok_or(PlacementError::MissingShip(kind))?;
            board.place(Placement::from_cells(kind, cells)?)?;
        }
        debug_assert!(board.is_complete());

        self.players[idx].board = board;
        self.players[idx].ready = true;

        let both_ready =
            self.players.len() == 2 && self.players.iter().all(|p| p.ready);
        if both_ready {
            self.phase = Phase::Ready;
            // Fixed deterministic rule: the creator moves first.
            let first = self.creator().clone();
            self.turn = Some(first.clone());
            self.phase = Phase::Playing;
            self.started_at = Some(Instant::now());
            Ok(vec![(
                Recipient::All,
                ServerMessage::GameStart {
                    current_turn: first,
                },
            )])
        } else {
            Ok(vec![(
                Recipient::All,
                ServerMessage::PlayerReady {
                    player: user.clone(),
                },
            )])
        }
    }

    /// Resolves an attack from the turn owner against the opponent.
    fn attack(
        &mut self,
        user: &UserId,
        target: Coord,
    ) -> Result<Events, GameError> {
        let idx = self
            .index_of(user)
            .ok_or_else(|| GameError::NotAParticipant(user.clone()))?;

        match self.phase {
            Phase::Placement | Phase::Ready => return Err(GameError::NotStarted),
            Phase::Finished => return Err(GameError::MatchOver),
            Phase::Playing => {}
        }
        if self.turn.as_ref() != Some(user) {
            return Err(GameError::NotYourTurn);
        }

        let opp_idx = 1 - idx;
        let outcome = resolve_attack(&mut self.players[opp_idx].board, target)?;

        let attacker = self.players[idx].user.clone();
        let defender = self.players[opp_idx].user.clone();

        if outcome.all_sunk {
            self.phase = Phase::Finished;
            self.winner = Some(attacker.clone());
            self.turn = None;
            self.duration = self.started_at.map(|t| t.elapsed());
            Ok(vec![
                (
                    Recipient::All,
                    ServerMessage::AttackResult {
                        attacker: attacker.clone(),
                        x: target.x,
                        y: target.y,
                        hit: outcome.hit,
                        sunk_ship: outcome.sunk,
                        current_turn: attacker.clone(),
                    },
                ),
                (
                    Recipient::All,
                    ServerMessage::GameOver { winner: attacker },
                ),
            ])
        } else {
            self.turn = Some(defender.clone());
            Ok(vec![(
                Recipient::All,
                ServerMessage::AttackResult {
                    attacker,
                    x: target.x,
                    y: target.y,
                    hit: outcome.hit,
                    sunk_ship: outcome.sunk,
                    current_turn: defender,
                },
            )])
        }
    }

    /// Relays a chat line to the room (sender included).
    ///
    /// Legal in every phase; never touches phase or turn.
    fn chat(
        &mut self,
        user: &UserId,
        message: String,
    ) -> Result<Events, GameError> {
        if !self.contains(user) {
            return Err(GameError::NotAParticipant(user.clone()));
        }
        Ok(vec![(
            Recipient::All,
            ServerMessage::Chat {
                username: user.clone(),
                message,
            },
        )])
    }

    // -- Connection lifecycle ----------------------------------------------

    /// Marks a participant's connection as gone. Game state is untouched;
    /// the caller decides whether a grace timer applies.
    pub fn disconnect(&mut self, user: &UserId) -> Result<(), GameError> {
        let idx = self
            .index_of(user)
            .ok_or_else(|| GameError::NotAParticipant(user.clone()))?;
        self.players[idx].connected = false;
        Ok(())
    }

    /// Marks a participant's connection as restored.
    pub fn reconnect(&mut self, user: &UserId) -> Result<(), GameError> {
        let idx = self
            .index_of(user)
            .ok_or_else(|| GameError::NotAParticipant(user.clone()))?;
        self.players[idx].connected = true;
        Ok(())
    }

    /// Ends the match against a participant who failed to return within
    /// the grace window. The remaining participant wins.
    ///
    /// Returns `None` when no forfeiture applies: the match is not in
    /// `Playing`, the quitter is unknown, or the quitter reattached in
    /// the meantime.
    pub fn forfeit(&mut self, quitter: &UserId) -> Option<Events> {
        if self.phase != Phase::Playing {
            return None;
        }
        let idx = self.index_of(quitter)?;
        if self.players[idx].connected {
            return None;
        }
        let winner = self.players[1 - idx].user.clone();

        self.phase = Phase::Finished;
        self.winner = Some(winner.clone());
        self.turn = None;
        self.duration = self.started_at.map(|t| t.elapsed());
        Some(vec![(
            Recipient::All,
            ServerMessage::GameOver { winner },
        )])
    }
}

// =========================================================================
// Tests
// =========================================================================
