//! TCP transport implementation using `tokio::net`.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::{AttemptId, Transport, TransportConfig, TransportError};

/// A [`Transport`] that opens one TCP connection per round trip.
///
/// The stream is owned by the `round_trip` future, so it is closed when
/// that future finishes, fails, or is dropped mid-flight.
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    /// Creates a transport with the given timeouts.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn connect(
        &self,
        addr: &str,
    ) -> Result<TcpStream, TransportError> {
        match timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            }),
            Err(_) => Err(TransportError::ConnectTimeout {
                addr: addr.to_string(),
                timeout: self.config.connect_timeout,
            }),
        }
    }

    /// Reads until the peer closes or a read stalls past the read timeout.
    async fn read_to_close(
        &self,
        stream: &mut TcpStream,
        id: AttemptId,
    ) -> Result<Vec<u8>, TransportError> {
        let mut response = Vec::new();
        let mut chunk = vec![0u8; self.config.read_chunk_size];

        loop {
            match timeout(self.config.read_timeout, stream.read(&mut chunk))
                .await
            {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    response.extend_from_slice(&chunk[..n]);
                    tracing::trace!(%id, n, total = response.len(), "read chunk");
                }
                Ok(Err(e)) => return Err(TransportError::ReceiveFailed(e)),
                Err(_) if response.is_empty() => {
                    return Err(TransportError::ReadTimeout {
                        timeout: self.config.read_timeout,
                    });
                }
                Err(_) => {
                    // The peer went quiet without closing; keep what we have.
                    tracing::debug!(
                        %id,
                        bytes = response.len(),
                        "read stalled after partial response, treating as complete"
                    );
                    break;
                }
            }
        }

        Ok(response)
    }
}

impl Transport for TcpTransport {
    async fn round_trip(
        &self,
        addr: &str,
        request: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        let id = AttemptId::next();
        let mut stream = self.connect(addr).await?;
        tracing::debug!(%id, addr, bytes = request.len(), "connected, sending request");

        match timeout(self.config.write_timeout, stream.write_all(request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::SendFailed(e)),
            Err(_) => {
                return Err(TransportError::SendTimeout {
                    timeout: self.config.write_timeout,
                });
            }
        }

        let response = self.read_to_close(&mut stream, id).await?;
        tracing::debug!(%id, bytes = response.len(), "response received");
        Ok(response)
    }
}
