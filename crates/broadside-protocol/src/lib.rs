//! Wire protocol for Broadside.
//!
//! This crate defines the language clients and server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`UserId`],
//!   [`RoomCode`], [`Coord`], [`ShipKind`]) — the structures that travel
//!   on the wire, plus [`Recipient`] for directing outbound events.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to and from wire text.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (raw frames) and session
//! (player identity). It knows nothing about connections or rooms.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Coord, Recipient, RoomCode, ServerMessage, ShipKind,
    ShipsSpec, UserId,
};
