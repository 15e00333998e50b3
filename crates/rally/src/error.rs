//! Unified error type for the Rally facade.

use rally_client::{ClientError, ServerError};

/// Top-level error that wraps everything a facade call can fail with.
///
/// Client failures (transport, protocol, server) pass through unchanged;
/// the facade adds one failure of its own, a `data` payload that doesn't
/// have the shape the command promises.
#[derive(Debug, thiserror::Error)]
pub enum RallyError {
    /// The request failed below the facade.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The server answered successfully but `data` is missing a required
    /// field or has the wrong type.
    #[error("{command} returned malformed data: {reason}")]
    MalformedPayload { command: String, reason: String },
}

impl RallyError {
    /// Returns the server error, if the server is the one that refused.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            RallyError::Client(e) => e.server_error(),
            RallyError::MalformedPayload { .. } => None,
        }
    }

    /// Returns `true` if the server answered with `COMMAND_EXECUTION_ERROR`.
    pub fn is_command_execution_error(&self) -> bool {
        matches!(self, RallyError::Client(e) if e.is_command_execution_error())
    }

    /// A short code naming the failure kind.
    pub fn code(&self) -> &str {
        match self {
            RallyError::Client(e) => e.code(),
            RallyError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rally_client::TransportError;
    use rally_protocol::COMMAND_EXECUTION_ERROR;

    use super::*;

    #[test]
    fn test_from_client_error_is_transparent() {
        let client = ClientError::Connection {
            attempts: 3,
            last: TransportError::ReadTimeout { timeout: Duration::from_secs(10) },
        };
        let text = client.to_string();
        let err: RallyError = client.into();
        assert!(matches!(err, RallyError::Client(_)));
        assert_eq!(err.to_string(), text);
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }

    #[test]
    fn test_command_execution_error_passes_through() {
        let err: RallyError = ClientError::Server(ServerError {
            command: "attack".into(),
            code: COMMAND_EXECUTION_ERROR.into(),
            message: "target not reachable".into(),
            details: None,
        })
        .into();
        assert!(err.is_command_execution_error());
        assert_eq!(err.server_error().map(|e| e.command.as_str()), Some("attack"));
    }

    #[test]
    fn test_malformed_payload() {
        let err = RallyError::MalformedPayload {
            command: "query_path".into(),
            reason: "missing field `path`".into(),
        };
        assert_eq!(err.code(), "MALFORMED_PAYLOAD");
        assert!(err.server_error().is_none());
        assert!(!err.is_command_execution_error());
        assert!(err.to_string().contains("query_path"));
    }
}
