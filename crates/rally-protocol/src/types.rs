//! Envelope types for the game-control wire format.
//!
//! Every exchange is one [`RequestEnvelope`] from us and one
//! [`ResponseEnvelope`] back, each a single JSON object:
//!
//! ```text
//! → { "apiVersion": "1.0", "requestId": "<uuid>", "command": "<verb>",
//!     "params": {...}, "language": "zh" }
//! ← { "requestId": "<same uuid>", "status": 1, "data": {...} }
//! ← { "requestId": "<same uuid>", "status": -1,
//!     "error": { "code": "...", "message": "...", "details": {...} } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version sent in every request.
pub const API_VERSION: &str = "1.0";

/// The server's generic "command could not execute" error code.
///
/// The server uses this one code both for real faults and for expected
/// "cannot do that right now" answers; a few facade operations map it to
/// a negative result instead of an error.
pub const COMMAND_EXECUTION_ERROR: &str = "COMMAND_EXECUTION_ERROR";

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Identifier correlating a response with the request that triggered it.
///
/// Generated as a random (v4) UUID and carried on the wire as its
/// hyphenated string. Comparison is plain string equality, so whatever
/// the server echoes back must match byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh, globally unique request id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Localization hint for human-readable text in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Zh => f.write_str("zh"),
            Language::En => f.write_str("en"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language {other:?}, expected zh or en")),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One request to the game server. Built once per logical call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub api_version: String,
    pub request_id: RequestId,
    /// The verb naming the server operation, e.g. `"move_actor"`.
    pub command: String,
    /// Command-specific arguments.
    pub params: Value,
    pub language: Language,
}

impl RequestEnvelope {
    /// Builds a request with a freshly generated [`RequestId`].
    pub fn new(
        api_version: impl Into<String>,
        command: impl Into<String>,
        params: Value,
        language: Language,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            request_id: RequestId::new(),
            command: command.into(),
            params,
            language,
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

fn default_error_code() -> String {
    "UNKNOWN_ERROR".to_string()
}

fn default_error_message() -> String {
    "unknown error".to_string()
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default = "default_error_code")]
    pub code: String,
    #[serde(default = "default_error_message")]
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

impl Default for ServerErrorBody {
    /// What a failed response without an `error` member is read as.
    fn default() -> Self {
        Self {
            code: default_error_code(),
            message: default_error_message(),
            details: None,
        }
    }
}

/// The server's answer to one request.
///
/// `status < 0` is failure (read `error`); anything else is accepted and
/// `data` read as-is. A missing `status` reads as `0`. A missing
/// `requestId` deserializes as `None`, which never matches the request
/// and is rejected by the correlator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServerErrorBody>,
}

impl ResponseEnvelope {
    /// Returns `true` if the server reported success.
    pub fn is_success(&self) -> bool {
        self.status > 0
    }

    /// Returns `true` if the server reported failure.
    pub fn is_failure(&self) -> bool {
        self.status < 0
    }
}

// =========================================================================
// Tests
// =========================================================================
