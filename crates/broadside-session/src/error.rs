//! Error types for the session layer.

use broadside_protocol::UserId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential was invalid, expired, or rejected by the
    /// identity collaborator.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session record exists for the given user.
    #[error("no session for {0}")]
    NotFound(UserId),

    /// The user already has a live connection. A second simultaneous
    /// connection for the same identity is refused rather than allowed
    /// to race the first.
    #[error("{0} is already connected")]
    AlreadyConnected(UserId),
}
