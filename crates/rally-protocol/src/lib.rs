//! Wire protocol for Rally.
//!
//! This crate defines what the client and the game server say to each
//! other:
//!
//! - **Types** ([`RequestEnvelope`], [`ResponseEnvelope`], [`RequestId`],
//!   [`Language`]): the envelopes that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): turns envelopes into bytes
//!   and back.
//! - **Errors** ([`ProtocolError`]): failures while encoding a request or
//!   reading a response.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the client
//! (correlation and retry). It knows nothing about sockets, only
//! how to build and read envelopes.
//!
//! ```text
//! Transport (bytes) → Protocol (envelopes) → Client (correlate, retry)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    API_VERSION, COMMAND_EXECUTION_ERROR, Language, RequestEnvelope, RequestId,
    ResponseEnvelope, ServerErrorBody,
};
