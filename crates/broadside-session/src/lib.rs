//! Player identity and connection-session lifecycle for Broadside.
//!
//! 1. **Authentication** — resolving the bearer credential to a
//!    [`UserId`](broadside_protocol::UserId) ([`Authenticator`] trait;
//!    the identity service itself is an external collaborator).
//! 2. **Session tracking** — knowing who currently has a live
//!    connection ([`SessionManager`]).
//! 3. **Reconnection** — a player who re-authenticates within the grace
//!    window resumes their session; room membership survives the gap so
//!    an in-progress match can continue.

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod session;

pub use auth::{Authenticator, InsecureAuth};
pub use error::SessionError;
pub use manager::{ConnectOutcome, SessionManager};
pub use session::{Session, SessionConfig, SessionState};
