//! Room configuration.

use std::time::Duration;

/// Tunables for room lifecycle and timers.
///
/// The timer values are policy, not invariants — operators can shorten
/// or lengthen them without changing game semantics.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a participant who disconnects mid-game may be absent
    /// before the match is forfeited to their opponent.
    pub reconnect_grace: Duration,

    /// How long a room with zero attached connections is kept before
    /// teardown (pre-game, or mid-game after both peers vanish).
    pub idle_timeout: Duration,

    /// How long a finished room lingers for final message delivery when
    /// some participants are still attached.
    pub finished_linger: Duration,

    /// Length of generated room codes.
    pub code_length: usize,

    /// Bound of each room actor's command channel (backpressure).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            finished_linger: Duration::from_secs(30),
            code_length: 6,
            channel_size: 64,
        }
    }
}
