//! The session manager: tracks every player's connection state.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself — it is a plain
//! `HashMap` owned by the server state and accessed behind a mutex at a
//! higher level. The lock is only ever held across map operations,
//! never across I/O.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use broadside_protocol::UserId;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Whether a `connect` opened a brand-new session or resumed a recent
/// one within the grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// No usable prior record; a fresh session was created.
    Fresh,
    /// The player returned while their disconnect record was still
    /// within the grace window.
    Resumed,
}

/// Manages all player session records.
///
/// ## Lifecycle
///
/// ```text
/// connect() ──→ [Connected] ──disconnect()──→ [Disconnected]
///                    ↑                              │
///                    └───────── connect() ──────────┤
///                                                   ▼ (grace elapsed)
///                                             expire_stale() → removed
/// ```
pub struct SessionManager {
    /// All session records, keyed by user. One session per identity.
    sessions: HashMap<UserId, Session>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    fn grace(&self) -> Duration {
        Duration::from_secs(self.config.reconnect_grace_secs)
    }

    /// Registers a live connection for `user`.
    ///
    /// A player who re-authenticates within the grace window resumes
    /// their session ([`ConnectOutcome::Resumed`]); past it, or with no
    /// prior record, they get a fresh one.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if a live connection already
    /// exists for this identity.
    pub fn connect(
        &mut self,
        user: UserId,
    ) -> Result<ConnectOutcome, SessionError> {
        let outcome = match self.sessions.get(&user) {
            Some(session) => match session.state {
                SessionState::Connected => {
                    return Err(SessionError::AlreadyConnected(user));
                }
                SessionState::Disconnected { since } => {
                    if since.elapsed() <= self.grace() {
                        ConnectOutcome::Resumed
                    } else {
                        ConnectOutcome::Fresh
                    }
                }
            },
            None => ConnectOutcome::Fresh,
        };

        self.sessions.insert(
            user.clone(),
            Session {
                user: user.clone(),
                state: SessionState::Connected,
            },
        );
        tracing::info!(%user, ?outcome, "session connected");
        Ok(outcome)
    }

    /// Marks a player as disconnected, starting their grace window.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session record exists.
    pub fn disconnect(&mut self, user: &UserId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(user)
            .ok_or_else(|| SessionError::NotFound(user.clone()))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };
        tracing::info!(%user, "session disconnected, grace window started");
        Ok(())
    }

    /// Drops every disconnected session whose grace window has elapsed.
    ///
    /// Called periodically from the server's maintenance sweep. Returns
    /// the users that were dropped.
    pub fn expire_stale(&mut self) -> Vec<UserId> {
        let grace = self.grace();
        let mut expired = Vec::new();

        self.sessions.retain(|user, session| {
            match session.state {
                SessionState::Disconnected { since }
                    if since.elapsed() > grace =>
                {
                    expired.push(user.clone());
                    false
                }
                _ => true,
            }
        });

        for user in &expired {
            tracing::info!(%user, "session expired");
        }
        expired
    }

    /// Looks up a session record.
    pub fn get(&self, user: &UserId) -> Option<&Session> {
        self.sessions.get(user)
    }

    /// The number of session records (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if there are no session records.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Time-dependent behavior is tested with a zero grace window
    //! (everything expires at once) or a one-hour window (nothing
    //! expires mid-test) instead of sleeping.

    use super::*;

    fn manager_with_instant_expiry() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 0,
        })
    }

    fn manager_with_long_grace() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 3600,
        })
    }

    fn uid(name: &str) -> UserId {
        UserId::from(name)
    }

    // =====================================================================
    // connect()
    // =====================================================================

    #[test]
    fn test_connect_new_user_is_fresh() {
        let mut mgr = manager_with_long_grace();
        let outcome = mgr.connect(uid("alice")).unwrap();
        assert_eq!(outcome, ConnectOutcome::Fresh);
        assert!(matches!(
            mgr.get(&uid("alice")).unwrap().state,
            SessionState::Connected
        ));
    }

    #[test]
    fn test_connect_while_connected_rejected() {
        let mut mgr = manager_with_long_grace();
        mgr.connect(uid("alice")).unwrap();

        let r = mgr.connect(uid("alice"));
        assert!(
            matches!(r, Err(SessionError::AlreadyConnected(u)) if u == uid("alice"))
        );
    }

    #[test]
    fn test_connect_within_grace_resumes() {
        let mut mgr = manager_with_long_grace();
        mgr.connect(uid("alice")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();

        let outcome = mgr.connect(uid("alice")).unwrap();
        assert_eq!(outcome, ConnectOutcome::Resumed);
    }

    #[test]
    fn test_connect_after_grace_is_fresh() {
        // Zero grace: the record is stale the moment it disconnects.
        let mut mgr = manager_with_instant_expiry();
        mgr.connect(uid("alice")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let outcome = mgr.connect(uid("alice")).unwrap();
        assert_eq!(outcome, ConnectOutcome::Fresh);
    }

    #[test]
    fn test_connect_two_users_independent() {
        let mut mgr = manager_with_long_grace();
        mgr.connect(uid("alice")).unwrap();
        mgr.connect(uid("bob")).unwrap();
        assert_eq!(mgr.len(), 2);
    }

    // =====================================================================
    // disconnect()
    // =====================================================================

    #[test]
    fn test_disconnect_connected_user_starts_grace() {
        let mut mgr = manager_with_long_grace();
        mgr.connect(uid("alice")).unwrap();

        mgr.disconnect(&uid("alice")).unwrap();

        assert!(matches!(
            mgr.get(&uid("alice")).unwrap().state,
            SessionState::Disconnected { .. }
        ));
    }

    #[test]
    fn test_disconnect_unknown_user_returns_not_found() {
        let mut mgr = manager_with_long_grace();
        let r = mgr.disconnect(&uid("ghost"));
        assert!(matches!(r, Err(SessionError::NotFound(_))));
    }

    // =====================================================================
    // expire_stale()
    // =====================================================================

    #[test]
    fn test_expire_stale_drops_timed_out_sessions() {
        let mut mgr = manager_with_instant_expiry();
        mgr.connect(uid("alice")).unwrap();
        mgr.connect(uid("bob")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let expired = mgr.expire_stale();

        assert_eq!(expired, vec![uid("alice")]);
        assert!(mgr.get(&uid("alice")).is_none());
        assert!(matches!(
            mgr.get(&uid("bob")).unwrap().state,
            SessionState::Connected
        ));
    }

    #[test]
    fn test_expire_stale_keeps_sessions_within_grace() {
        let mut mgr = manager_with_long_grace();
        mgr.connect(uid("alice")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();

        let expired = mgr.expire_stale();

        assert!(expired.is_empty());
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_expire_stale_empty_manager_returns_empty() {
        let mut mgr = manager_with_long_grace();
        assert!(mgr.expire_stale().is_empty());
    }

    // =====================================================================
    // Full lifecycle
    // =====================================================================

    #[test]
    fn test_full_lifecycle_connect_drop_resume() {
        let mut mgr = manager_with_long_grace();

        mgr.connect(uid("alice")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();
        let outcome = mgr.connect(uid("alice")).unwrap();

        assert_eq!(outcome, ConnectOutcome::Resumed);
        assert!(matches!(
            mgr.get(&uid("alice")).unwrap().state,
            SessionState::Connected
        ));
    }

    #[test]
    fn test_full_lifecycle_connect_drop_expire() {
        let mut mgr = manager_with_instant_expiry();

        mgr.connect(uid("alice")).unwrap();
        mgr.disconnect(&uid("alice")).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let expired = mgr.expire_stale();

        assert_eq!(expired, vec![uid("alice")]);
        assert!(mgr.is_empty());
    }
}
