//! Error types for the protocol layer.
//!
//! A `ProtocolError` means the two ends disagree about the wire format or
//! about which request a response belongs to. Retrying on a new socket
//! would produce the same disagreement, so none of these are retryable.

use crate::RequestId;

/// Errors that can occur while encoding requests or validating responses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a request into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The response bytes are not well-formed JSON.
    #[error("response is not valid JSON: {0}")]
    Decode(serde_json::Error),

    /// The response is JSON but not a valid response envelope.
    #[error("invalid response envelope: {0}")]
    InvalidResponse(String),

    /// The response answers a different request than the one we sent.
    #[error("response request id {actual:?} does not match request {expected}")]
    RequestIdMismatch {
        expected: RequestId,
        actual: Option<RequestId>,
    },
}

impl ProtocolError {
    /// The wire-style code for this error, matching the codes the server
    /// uses for its own failures.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Encode(_) => "ENCODE_ERROR",
            ProtocolError::Decode(_) => "INVALID_JSON",
            ProtocolError::InvalidResponse(_) => "INVALID_RESPONSE",
            ProtocolError::RequestIdMismatch { .. } => "REQUEST_ID_MISMATCH",
        }
    }
}
