//! Deadline-bounded polling for Rally's wait helpers.
//!
//! Long game operations (production, movement) don't report completion;
//! the client has to ask again and again until the answer changes. This
//! crate owns that loop so every helper shares one timing rule:
//!
//! ```text
//!           check() == true
//! PENDING ───────────────────→ DONE
//!    │ ↺ sleep(interval)
//!    └── deadline reached ───→ TIMED_OUT
//! ```
//!
//! Timing out is an ordinary outcome ([`WaitOutcome::TimedOut`]), not an
//! error: a unit still on its way after ten seconds is normal in an RTS.
//! Errors only come from the check itself and are returned as-is.
//!
//! # Integration
//!
//! ```ignore
//! let outcome = poll_until(&PollConfig::production(), || async {
//!     api.is_ready(wait_id).await
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How often to check and how long to keep trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two checks.
    pub interval: Duration,
    /// Total budget, measured from the first check.
    pub timeout: Duration,
}

impl PollConfig {
    /// Shortest accepted interval. Zero would spin the server.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Waiting for a production task: 100 ms checks for up to 20 s.
    pub fn production() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(20))
    }

    /// Waiting for units to arrive: 300 ms checks for up to 10 s.
    pub fn movement() -> Self {
        Self::new(Duration::from_millis(300), Duration::from_secs(10))
    }

    /// Same interval, different budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`poll_until`]. A zero `timeout` is kept:
    /// it means "check exactly once".
    pub fn validated(mut self) -> Self {
        self.interval = self.interval.max(Self::MIN_INTERVAL);
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::production()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition held before the deadline.
    Done,
    /// The deadline passed first.
    TimedOut,
}

impl WaitOutcome {
    pub fn is_done(self) -> bool {
        self == WaitOutcome::Done
    }

    pub fn is_timed_out(self) -> bool {
        self == WaitOutcome::TimedOut
    }
}

impl From<WaitOutcome> for bool {
    fn from(outcome: WaitOutcome) -> bool {
        outcome.is_done()
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Runs `check` until it returns `Ok(true)` or the deadline passes.
///
/// The first check runs immediately. After each negative answer the loop
/// sleeps `interval`, except that the last sleep is cut short at the
/// deadline and one final check runs exactly there. So the call returns
/// no later than `timeout` plus the duration of one check.
///
/// # Errors
///
/// The first `Err` from `check` ends the loop and is returned unchanged.
pub async fn poll_until<F, Fut, E>(config: &PollConfig, mut check: F) -> Result<WaitOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let config = config.validated();
    let deadline = saturating_after(Instant::now(), config.timeout);
    let mut checks = 0u32;

    loop {
        checks += 1;
        if check().await? {
            trace!(checks, "condition met");
            return Ok(WaitOutcome::Done);
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(checks, timeout = ?config.timeout, "wait timed out");
            return Ok(WaitOutcome::TimedOut);
        }

        trace!(checks, "condition not met yet");
        time::sleep_until(saturating_after(now, config.interval).min(deadline)).await;
    }
}

/// Roughly 30 years: how far ahead "never" is.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `base + step`, or [`FAR_FUTURE`] past `base` if that overflows, so a
/// `Duration::MAX` timeout means "no deadline" rather than a panic.
fn saturating_after(base: Instant, step: Duration) -> Instant {
    base.checked_add(step).unwrap_or_else(|| base + FAR_FUTURE)
}
