//! Error types for the client layer.
//!
//! The client sorts every failure into one of four buckets. Only the
//! first one is worth a retry:
//!
//! | Variant        | Meaning                                   | Retried? |
//! |----------------|-------------------------------------------|----------|
//! | `Transport`    | one connection attempt failed             | yes      |
//! | `Protocol`     | the answer is unreadable or misaddressed  | no       |
//! | `Server`       | the server understood and said no         | no       |
//! | `Connection`   | every allowed attempt failed at transport | (final)  |

use rally_protocol::{COMMAND_EXECUTION_ERROR, ProtocolError, ServerErrorBody};
use rally_transport::TransportError;
use serde_json::Value;

/// A failure reported by the game server in a `status < 0` response.
///
/// `code`, `message` and `details` are passed through untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{command} failed with {code}: {message}")]
pub struct ServerError {
    /// The command whose request the server rejected.
    pub command: String,
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl ServerError {
    pub(crate) fn from_body(command: &str, body: ServerErrorBody) -> Self {
        Self {
            command: command.to_string(),
            code: body.code,
            message: body.message,
            details: body.details,
        }
    }

    /// Returns `true` for the server's catch-all execution failure code.
    pub fn is_command_execution_error(&self) -> bool {
        self.code == COMMAND_EXECUTION_ERROR
    }
}

/// Errors returned by [`GameClient`](crate::GameClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A single attempt failed below the protocol (connect, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response could not be decoded, was malformed, or answered a
    /// different request.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server processed the request and reported an error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Every allowed attempt failed at the transport level.
    #[error("server unreachable after {attempts} attempts: {last}")]
    Connection {
        attempts: u32,
        #[source]
        last: TransportError,
    },
}

impl ClientError {
    /// Returns `true` if another attempt on a fresh connection could
    /// succeed. This is the classifier the retry loop uses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Returns the server error, if the server is the one that refused.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ClientError::Server(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the server answered with `COMMAND_EXECUTION_ERROR`.
    pub fn is_command_execution_error(&self) -> bool {
        self.server_error()
            .is_some_and(ServerError::is_command_execution_error)
    }

    /// A short code naming the failure kind.
    ///
    /// Server errors keep the server's own code; local failures use the
    /// same vocabulary (`TIMEOUT`, `CONNECTION_ERROR`, `INVALID_JSON`, ...).
    pub fn code(&self) -> &str {
        match self {
            ClientError::Transport(e) if e.is_timeout() => "TIMEOUT",
            ClientError::Transport(_) => "CONNECTION_ERROR",
            ClientError::Connection { .. } => "CONNECTION_ERROR",
            ClientError::Protocol(e) => e.code(),
            ClientError::Server(e) => &e.code,
        }
    }
}
