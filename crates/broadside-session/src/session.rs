//! Session types: the server's record of a connected player.

use std::time::Instant;

use broadside_protocol::UserId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a disconnected player may be absent before
    /// their session record is dropped. The per-room forfeiture grace
    /// window is configured separately on the room layer; this value
    /// only bounds how long the server remembers the connection record.
    ///
    /// Default: 30 seconds. Set to 0 to drop records immediately.
    pub reconnect_grace_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a player's connection session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace elapses)──→ dropped
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// `Instant` is monotonic, so grace-window math is immune to wall-clock
/// adjustments.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// A live connection is attached.
    Connected,
    /// The connection dropped at `since`; the player may return by
    /// re-authenticating with the same credential.
    Disconnected { since: Instant },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One player's session record.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which player this session belongs to.
    pub user: UserId,
    /// Current connection state.
    pub state: SessionState,
}
