//! Room lifecycle management for Broadside.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! [`GameSession`](broadside_game::GameSession); the registry maps room
//! codes and users to those actors.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — code allocation, membership, routing, teardown
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — timers and limits (grace window, idle timeout)
//! - [`HistorySink`] / [`MatchRecord`] — the match-history handoff
//!   boundary

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod history;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use history::{HistorySink, MatchRecord, MemoryHistory, NullHistory};
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
