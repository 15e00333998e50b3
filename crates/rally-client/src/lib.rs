//! Client for the Rally game-control protocol.
//!
//! [`GameClient`] turns a command name and a JSON parameter object into a
//! validated [`ResponseEnvelope`]:
//!
//! ```text
//! call(command, params)
//!   → RequestEnvelope (fresh RequestId)
//!   → Transport::round_trip            ← retried on transport failure
//!   → decode + check requestId + check status
//!   → Ok(ResponseEnvelope) | Err(ClientError)
//! ```
//!
//! The typed game operations live one layer up, in the `rally` crate.

mod client;
mod config;
mod error;

pub use client::GameClient;
pub use config::{ClientBuilder, ClientConfig, DEFAULT_PORT, RetryPolicy};
pub use error::{ClientError, ServerError};

pub use rally_protocol::{Language, RequestId, ResponseEnvelope};
pub use rally_transport::{Transport, TransportConfig, TransportError};
