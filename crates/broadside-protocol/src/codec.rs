//! Codec trait and implementations for serializing messages.
//!
//! The wire format is UTF-8 text (one JSON object per frame), so codecs
//! work in terms of `String`/`&str` rather than byte buffers. The trait
//! exists so the transport and handler layers stay format-agnostic;
//! [`JsonCodec`] is the production implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust types to wire text and decodes wire text back.
///
/// `Send + Sync + 'static` so a codec can be stored in the shared server
/// state and used from any connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes one wire frame into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the text is malformed,
    /// truncated, or does not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
