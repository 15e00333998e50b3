//! Shared helpers: a scripted in-memory transport.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rally_client::{Transport, TransportError};
use rally_protocol::RequestEnvelope;
use serde_json::{Value, json};

/// What the fake server does with one attempt.
pub enum Step {
    /// Send these bytes and close.
    Reply(Vec<u8>),
    /// Fail the attempt at the transport level.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

type Script = dyn Fn(usize, &RequestEnvelope) -> Step + Send + Sync;

struct Inner {
    seen: Mutex<Vec<RequestEnvelope>>,
    script: Box<Script>,
}

/// A [`Transport`] whose answers come from a closure.
///
/// The closure receives the 1-based attempt number and the decoded
/// request. Every request is recorded for later inspection.
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl Fn(usize, &RequestEnvelope) -> Step + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                seen: Mutex::new(Vec::new()),
                script: Box::new(script),
            }),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.inner.seen.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.inner.seen.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn round_trip(&self, _addr: &str, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let request: RequestEnvelope =
            serde_json::from_slice(request).expect("client sent valid JSON");
        let attempt = {
            let mut seen = self.inner.seen.lock().unwrap();
            seen.push(request.clone());
            seen.len()
        };
        match (self.inner.script)(attempt, &request) {
            Step::Reply(bytes) => Ok(bytes),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Canned answers
// ---------------------------------------------------------------------------

pub fn success(request: &RequestEnvelope, data: Value) -> Step {
    Step::Reply(
        json!({ "requestId": request.request_id, "status": 1, "data": data })
            .to_string()
            .into_bytes(),
    )
}

pub fn failure(request: &RequestEnvelope, code: &str, message: &str) -> Step {
    Step::Reply(
        json!({
            "requestId": request.request_id,
            "status": -1,
            "error": { "code": code, "message": message }
        })
        .to_string()
        .into_bytes(),
    )
}

pub fn read_timeout() -> Step {
    Step::Fail(TransportError::ReadTimeout {
        timeout: Duration::from_secs(10),
    })
}
