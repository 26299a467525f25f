//! Error types for the game layer.
//!
//! Two classes, per the error-handling design: validation errors (bad
//! placement geometry, malformed coordinates) and protocol violations
//! (acting out of turn, re-targeting a cell, acting in the wrong phase).
//! Both are reported to the offending participant only and never change
//! game state.

use broadside_protocol::{Coord, ShipKind, UserId};

/// A rejected ship placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// Part of the ship would lie off the grid.
    #[error("{0} extends out of bounds")]
    OutOfBounds(ShipKind),

    /// The ship would overlap an already-placed ship.
    #[error("{0} overlaps another ship")]
    Overlap(ShipKind),

    /// That ship type is already on the board.
    #[error("{0} is already placed")]
    DuplicateShipType(ShipKind),

    /// The submitted coordinate list has the wrong number of cells.
    #[error("{kind} needs {expected} cells, got {got}")]
    WrongLength {
        kind: ShipKind,
        expected: u8,
        got: usize,
    },

    /// The submitted cells are not one contiguous, axis-aligned run.
    #[error("{0} cells must be contiguous along one row or column")]
    NotAligned(ShipKind),

    /// The fleet submission is missing a canonical ship type.
    #[error("fleet is missing {0}")]
    MissingShip(ShipKind),
}

/// A rejected attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    /// The target lies off the grid.
    #[error("coordinate {0} is off the board")]
    OutOfBounds(Coord),

    /// The cell was already resolved as Hit or Miss. Does not consume
    /// the turn.
    #[error("cell {0} was already targeted")]
    AlreadyTargeted(Coord),
}

/// A rejected game operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Attack(#[from] AttackError),

    /// An attack from a participant other than the turn owner.
    #[error("not your turn")]
    NotYourTurn,

    /// `place_ships` after the participant's fleet is already committed.
    #[error("ships are already committed")]
    ShipsCommitted,

    /// An attack before both fleets are committed.
    #[error("the game has not started")]
    NotStarted,

    /// Any game operation after the match finished.
    #[error("the match is already over")]
    MatchOver,

    /// A third participant tried to join.
    #[error("room is full")]
    MatchFull,

    /// The user is already a participant of this room.
    #[error("{0} is already in this room")]
    AlreadyJoined(UserId),

    /// The acting user is not a participant of this room.
    #[error("{0} is not in this room")]
    NotAParticipant(UserId),
}

impl GameError {
    /// `true` for the protocol-violation class: operations that are
    /// rejected without being reportable as client-side bugs (turn
    /// races, duplicate submissions). Logged at debug, not warn.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            GameError::NotYourTurn
                | GameError::ShipsCommitted
                | GameError::NotStarted
                | GameError::MatchOver
                | GameError::Attack(AttackError::AlreadyTargeted(_))
        )
    }
}
