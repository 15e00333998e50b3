//! Transport layer for Rally.
//!
//! Provides the [`Transport`] trait that abstracts one request/response
//! exchange with the game server, and [`TcpTransport`], the stream-socket
//! implementation.
//!
//! The game server speaks a very small discipline: one connection per
//! request, no framing, and the end of the response is signalled by the
//! server closing the connection. So a transport never keeps a socket
//! around between calls.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::TcpTransport;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counter for generating unique attempt IDs.
static NEXT_ATTEMPT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connection attempt, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Creates a new `AttemptId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique attempt ID.
    pub fn next() -> Self {
        Self(NEXT_ATTEMPT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timeouts and buffer sizing for a single round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
    /// Upper bound on writing the whole request.
    pub write_timeout: Duration,
    /// Upper bound on any single read. A read that stalls this long ends
    /// the response (or fails the call if nothing has arrived yet).
    pub read_timeout: Duration,
    /// Size of the buffer handed to each read.
    pub read_chunk_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            read_chunk_size: 4096,
        }
    }
}

impl TransportConfig {
    /// Smallest accepted timeout. Zero would make every call fail.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(1);

    /// Clamp any out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        self.connect_timeout = self.connect_timeout.max(Self::MIN_TIMEOUT);
        self.write_timeout = self.write_timeout.max(Self::MIN_TIMEOUT);
        self.read_timeout = self.read_timeout.max(Self::MIN_TIMEOUT);
        if self.read_chunk_size == 0 {
            tracing::warn!("read_chunk_size of 0 is unusable, using 4096");
            self.read_chunk_size = 4096;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Performs one request/response exchange with a peer.
///
/// Implementations must open a fresh connection for every call and must
/// release it on every exit path. [`TcpTransport`] is the real one; tests
/// substitute scripted fakes.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` to `addr` and returns every byte the peer sent back
    /// before closing the connection.
    fn round_trip(
        &self,
        addr: &str,
        request: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_id_new_and_into_inner() {
        let id = AttemptId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_attempt_id_display() {
        assert_eq!(AttemptId::new(7).to_string(), "attempt-7");
    }

    #[test]
    fn test_attempt_id_next_is_unique() {
        let a = AttemptId::next();
        let b = AttemptId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_default_config_matches_reference_timeouts() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert_eq!(cfg.write_timeout, Duration::from_secs(10));
        assert_eq!(cfg.read_timeout, Duration::from_secs(10));
        assert_eq!(cfg.read_chunk_size, 4096);
    }

    #[test]
    fn test_validated_clamps_zero_values() {
        let cfg = TransportConfig {
            connect_timeout: Duration::ZERO,
            write_timeout: Duration::ZERO,
            read_timeout: Duration::ZERO,
            read_chunk_size: 0,
        }
        .validated();
        assert_eq!(cfg.connect_timeout, TransportConfig::MIN_TIMEOUT);
        assert_eq!(cfg.write_timeout, TransportConfig::MIN_TIMEOUT);
        assert_eq!(cfg.read_timeout, TransportConfig::MIN_TIMEOUT);
        assert_eq!(cfg.read_chunk_size, 4096);
    }

    #[test]
    fn test_timeouts_are_classified() {
        let err = TransportError::ReadTimeout {
            timeout: Duration::from_secs(1),
        };
        assert!(err.is_timeout());

        let err = TransportError::SendTimeout {
            timeout: Duration::from_secs(1),
        };
        assert!(err.is_timeout());

        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe",
        ));
        assert!(!err.is_timeout());
    }
}
