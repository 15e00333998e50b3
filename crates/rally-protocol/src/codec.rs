//! Codec trait and implementations for serializing/deserializing envelopes.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The correlator doesn't care how envelopes are serialized; it just
//! needs something that implements the [`Codec`] trait.
//!
//! The game server speaks UTF-8 JSON, so [`JsonCodec`] is the only
//! implementation. The output carries no length prefix or delimiter:
//! message boundaries come from the server closing the connection.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads, because one client
///   value is shared by every concurrent call.
/// - `'static` → the codec doesn't borrow temporary data.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the receive buffer can be dropped
/// right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are not well-formed
    /// structured text or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Encoding is deterministic: the same envelope always produces the same
/// bytes, because struct fields serialize in declaration order.
///
/// ## Example
///
/// ```rust
/// use rally_protocol::{Codec, JsonCodec, Language, RequestEnvelope};
///
/// let codec = JsonCodec;
/// let request = RequestEnvelope::new(
///     "1.0",
///     "camera_move",
///     serde_json::json!({ "location": { "x": 3, "y": 4 } }),
///     Language::En,
/// );
///
/// let bytes = codec.encode(&request).unwrap();
/// let decoded: RequestEnvelope = codec.decode(&bytes).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        // `from_slice` also rejects invalid UTF-8, which is what we want:
        // the server promises UTF-8 text.
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
