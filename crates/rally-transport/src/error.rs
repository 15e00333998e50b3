use std::time::Duration;

/// Errors that can occur in the transport layer.
///
/// Every variant describes a failure of one connection attempt, not of the
/// request itself, so all of them are worth retrying on a fresh socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer refused the connection or was unreachable.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection was not established within the connect timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Writing the request failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The peer stopped accepting request bytes for longer than the write
    /// timeout.
    #[error("request not sent within {timeout:?}")]
    SendTimeout { timeout: Duration },

    /// A read stalled past the read timeout before any byte arrived.
    #[error("no response within {timeout:?}")]
    ReadTimeout { timeout: Duration },

    /// Reading the response failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` for the timeout variants.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout { .. }
                | TransportError::SendTimeout { .. }
                | TransportError::ReadTimeout { .. }
        )
    }
}
