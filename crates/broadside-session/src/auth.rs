//! Authentication hook for resolving player identity.
//!
//! Issuing and validating credentials is an external collaborator's job
//! — Broadside only defines the boundary: the [`Authenticator`] trait
//! maps the bearer credential from the connection's upgrade path to a
//! stable [`UserId`], and the handler calls it exactly once per
//! connection, before anything else.

use broadside_protocol::UserId;

use crate::SessionError;

/// Resolves a client's bearer credential to their identity.
///
/// `Send + Sync + 'static` so one authenticator instance can serve every
/// connection task concurrently.
///
/// # Example
///
/// ```rust
/// use broadside_session::{Authenticator, SessionError};
/// use broadside_protocol::UserId;
///
/// /// Accepts any non-empty token as the username itself.
/// /// Development only — production wires in a real validator (JWT, …).
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<UserId, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         Ok(UserId(token.to_string()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given credential and returns the user's identity.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when the credential is invalid,
    /// expired, or rejected by the identity service.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}

/// The development authenticator: the token IS the username.
///
/// Rejects empty tokens and tokens that are not simple identifiers, so
/// tests and local clients can connect as `ws://…/ws/alice` without an
/// identity service running.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureAuth;

impl Authenticator for InsecureAuth {
    async fn authenticate(&self, token: &str) -> Result<UserId, SessionError> {
        let ok = !token.is_empty()
            && token.len() <= 32
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !ok {
            return Err(SessionError::AuthFailed(
                "token must be a short identifier".into(),
            ));
        }
        Ok(UserId(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insecure_auth_accepts_simple_name() {
        let id = InsecureAuth.authenticate("alice_1").await.unwrap();
        assert_eq!(id, UserId::from("alice_1"));
    }

    #[tokio::test]
    async fn test_insecure_auth_rejects_empty_token() {
        let r = InsecureAuth.authenticate("").await;
        assert!(matches!(r, Err(SessionError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_insecure_auth_rejects_exotic_characters() {
        let r = InsecureAuth.authenticate("a/b?c").await;
        assert!(matches!(r, Err(SessionError::AuthFailed(_))));
    }
}
