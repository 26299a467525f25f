//! Error types for the room layer.

use broadside_protocol::{RoomCode, UserId};

/// Errors that can occur during room operations.
///
/// All of these are reported to the requester as a wire `error` event;
/// the connection stays usable for further room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room already has two participants.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The user is already a participant of this room.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(UserId, RoomCode),

    /// The user is not in any room (or not in this one).
    #[error("{0} is not in a room")]
    NotInRoom(UserId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's actor is gone or its command channel is full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
