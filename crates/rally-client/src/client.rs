//! `GameClient`: request/response correlation and retry.
//!
//! One logical call is one [`RequestEnvelope`] with one [`RequestId`]. The
//! client sends it over a fresh connection, checks that the answer belongs
//! to it, and turns the answer into either the response envelope or a
//! [`ClientError`]. Transport failures are retried with the *same*
//! request id; everything else ends the call immediately.

use rally_protocol::{
    Codec, JsonCodec, ProtocolError, RequestEnvelope, ResponseEnvelope,
};
use rally_transport::{TcpTransport, Transport};
use serde_json::Value;
use std::time::Duration;

use crate::error::{ClientError, ServerError};
use crate::{ClientBuilder, ClientConfig};

impl ClientBuilder {
    /// Builds a client that talks TCP to the configured server.
    pub fn build(self) -> GameClient {
        GameClient::new(self.into_config())
    }

    /// Builds a client on top of a caller-supplied transport.
    ///
    /// Tests use this to script the server side without sockets.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> GameClient<T> {
        GameClient::with_transport(self.into_config(), transport)
    }
}

/// Client for the game-control server.
///
/// Holds no connection between calls, so a single client can be shared
/// (by reference or `Arc`) between any number of concurrent tasks.
#[derive(Debug, Clone)]
pub struct GameClient<T = TcpTransport, C = JsonCodec> {
    config: ClientConfig,
    addr: String,
    transport: T,
    codec: C,
}

impl GameClient<TcpTransport, JsonCodec> {
    /// Creates a TCP client from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let config = config.validated();
        let transport = TcpTransport::new(config.transport.clone());
        Self::with_transport(config, transport)
    }

    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// One-shot liveness check against `host:port`.
    ///
    /// Connect, write, read and the whole ping are each bounded by `timeout`.
    pub async fn is_server_running(host: &str, port: u16, timeout: Duration) -> bool {
        ClientBuilder::new()
            .host(host)
            .port(port)
            .connect_timeout(timeout)
            .write_timeout(timeout)
            .read_timeout(timeout)
            .probe_timeout(timeout)
            .build()
            .ping()
            .await
    }
}

impl<T: Transport> GameClient<T, JsonCodec> {
    /// Creates a client that uses `transport` for every attempt.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let config = config.validated();
        let addr = config.addr();
        Self {
            config,
            addr,
            transport,
            codec: JsonCodec,
        }
    }
}

impl<T, C> GameClient<T, C>
where
    T: Transport,
    C: Codec,
{
    /// The validated configuration this client runs with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The `host:port` every attempt connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends `command` with `params` and returns the successful response.
    ///
    /// Transport failures are retried up to `max_retries` attempts in
    /// total, sleeping `retry_delay` in between. Every attempt carries the
    /// same request id, so the server can recognise a repeat.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Connection`] once every attempt failed at transport.
    /// - [`ClientError::Protocol`] if a response was unreadable, malformed,
    ///   or answered another request.
    /// - [`ClientError::Server`] if the server reported a failure.
    pub async fn call(
        &self,
        command: &str,
        params: Value,
    ) -> Result<ResponseEnvelope, ClientError> {
        let request = self.envelope(command, params);
        let bytes = self.codec.encode(&request)?;
        let policy = &self.config.retry;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.exchange(&request, &bytes).await {
                Err(ClientError::Transport(last)) => {
                    if attempt >= policy.max_retries {
                        tracing::warn!(
                            request_id = %request.request_id,
                            command,
                            attempts = attempt,
                            error = %last,
                            "giving up"
                        );
                        return Err(ClientError::Connection {
                            attempts: attempt,
                            last,
                        });
                    }
                    tracing::debug!(
                        request_id = %request.request_id,
                        command,
                        attempt,
                        error = %last,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(policy.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    /// Sends `command` exactly once, with no retry.
    ///
    /// Transport failures come back as [`ClientError::Transport`].
    pub async fn call_once(
        &self,
        command: &str,
        params: Value,
    ) -> Result<ResponseEnvelope, ClientError> {
        let request = self.envelope(command, params);
        let bytes = self.codec.encode(&request)?;
        self.exchange(&request, &bytes).await
    }

    /// Returns `true` if the server answers a `ping` with a positive status
    /// and data within the probe timeout. Never fails.
    pub async fn ping(&self) -> bool {
        let probe = self.call_once("ping", serde_json::json!({}));
        match tokio::time::timeout(self.config.probe_timeout, probe).await {
            Ok(Ok(response)) => response.is_success() && response.data.is_some(),
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, error = %e, "ping failed");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "ping timed out");
                false
            }
        }
    }

    fn envelope(&self, command: &str, params: Value) -> RequestEnvelope {
        RequestEnvelope::new(
            &self.config.api_version,
            command,
            params,
            self.config.language,
        )
    }

    /// One attempt: round trip, then validate.
    async fn exchange(
        &self,
        request: &RequestEnvelope,
        bytes: &[u8],
    ) -> Result<ResponseEnvelope, ClientError> {
        tracing::trace!(
            request_id = %request.request_id,
            command = %request.command,
            "sending request"
        );
        let raw = self.transport.round_trip(&self.addr, bytes).await?;
        validate(&self.codec, request, &raw)
    }
}

/// Turns the raw answer to `request` into a response or an error.
///
/// Checks run in a fixed order: well-formed JSON, envelope shape, request
/// id, then status. Only a negative status is a failure; `0` (or no
/// status at all) is accepted like a positive one.
fn validate<C: Codec>(
    codec: &C,
    request: &RequestEnvelope,
    raw: &[u8],
) -> Result<ResponseEnvelope, ClientError> {
    let value: Value = codec.decode(raw)?;
    if !value.is_object() {
        return Err(ProtocolError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        ))
        .into());
    }

    let response: ResponseEnvelope = serde_json::from_value(value)
        .map_err(|e| ProtocolError::InvalidResponse(e.to_string()))?;

    if response.request_id.as_ref() != Some(&request.request_id) {
        tracing::warn!(
            expected = %request.request_id,
            actual = ?response.request_id,
            "response for another request"
        );
        return Err(ProtocolError::RequestIdMismatch {
            expected: request.request_id.clone(),
            actual: response.request_id,
        }
        .into());
    }

    if response.is_failure() {
        let body = response.error.unwrap_or_default();
        return Err(ServerError::from_body(&request.command, body).into());
    }

    Ok(response)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
