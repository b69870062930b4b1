//! Wall-clock access behind a trait so queue ageing can be driven by tests.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Current Unix time in milliseconds.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Minutes elapsed between two millisecond timestamps. Never negative.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn minutes_between(earlier_ms: u128, later_ms: u128) -> f64 {
    later_ms.saturating_sub(earlier_ms) as f64 / MS_PER_MINUTE
}

/// Source of "now" for the scheduler.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u128;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u128 {
        now_ms()
    }
}

/// Manually advanced clock. Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<u128>>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`.
    #[must_use]
    pub fn new(start_ms: u128) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by.as_millis();
    }

    /// Move time forward by whole minutes.
    pub fn advance_minutes(&self, minutes: u64) {
        self.advance(Duration::from_secs(minutes * 60));
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: u128) {
        *self.now.lock() = now_ms;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_700_000_000_000)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u128 {
        *self.now.lock()
    }
}
