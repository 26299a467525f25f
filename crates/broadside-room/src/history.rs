//! The match-history handoff boundary.
//!
//! When a room reaches `Finished`, the core hands one [`MatchRecord`]
//! to the configured [`HistorySink`] and forgets about it. Persistence,
//! match-history queries, and leaderboard aggregation all live behind
//! this boundary — the core never reads any of it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use broadside_protocol::UserId;

/// The record handed off for one finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// The room creator.
    pub player1: UserId,
    /// The joiner.
    pub player2: UserId,
    pub winner: UserId,
    pub loser: UserId,
    /// Wall-clock seconds from `game_start` to the finish.
    pub duration_secs: u64,
    pub finished_at: DateTime<Utc>,
}

/// Receives finished-match records.
///
/// Called at most once per room, from the room's own task, after the
/// `game_over` broadcast. A sink must handle its own failures — a lost
/// record never affects the room.
pub trait HistorySink: Send + Sync + 'static {
    /// Persists (or forwards) one finished match.
    fn record(
        &self,
        record: MatchRecord,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// A sink that only logs. The default for development and tests that
/// don't inspect history.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistory;

impl HistorySink for NullHistory {
    async fn record(&self, record: MatchRecord) {
        tracing::info!(
            winner = %record.winner,
            loser = %record.loser,
            duration_secs = record.duration_secs,
            "match finished (history sink disabled)"
        );
    }
}

/// An in-memory sink for tests: records are captured for inspection.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: std::sync::Mutex<Vec<MatchRecord>>,
}

impl MemoryHistory {
    /// Creates an empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().expect("history lock").clone()
    }
}

impl HistorySink for MemoryHistory {
    async fn record(&self, record: MatchRecord) {
        self.records.lock().expect("history lock").push(record);
    }
}
