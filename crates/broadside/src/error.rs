//! Unified error type for the Broadside server.

use broadside_protocol::ProtocolError;
use broadside_room::RoomError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts sub-crate errors automatically. Nothing here is
/// globally fatal: a connection task that ends with one of these only
/// takes its own connection down.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, duplicate connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_protocol::{RoomCode, UserId};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: BroadsideError = err.into();
        assert!(matches!(top, BroadsideError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: BroadsideError = err.into();
        assert!(matches!(top, BroadsideError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AuthFailed("nope".into());
        let top: BroadsideError = err.into();
        assert!(matches!(top, BroadsideError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomCode::new("AB12CD"));
        let top: BroadsideError = err.into();
        assert!(matches!(top, BroadsideError::Room(_)));
    }

    #[test]
    fn test_room_error_message_survives_wrapping() {
        let err = RoomError::NotInRoom(UserId::from("alice"));
        let top: BroadsideError = err.into();
        assert!(top.to_string().contains("alice"));
    }
}
