//! Remaining-wait heuristic.

use crate::config::EstimatorConfig;
use crate::core::{ResourcePool, Severity};

/// Estimates minutes until a queued patient is seen.
///
/// Approximates up to `capacity` parallel servers, where capacity is
/// `max(1, doctors + nurses / nurses_per_server)`. The patient at index `i` ahead of
/// the target contributes `service(sev_i) / min(i + 1, capacity)`, which charges the
/// head of the queue pessimistically for contention.
#[derive(Debug, Clone, Default)]
pub struct WaitTimeEstimator {
    params: EstimatorConfig,
}

impl WaitTimeEstimator {
    /// Create an estimator from tunables.
    #[must_use]
    pub const fn new(params: EstimatorConfig) -> Self {
        Self { params }
    }

    /// Parallel servers available according to `pool`.
    #[must_use]
    pub fn capacity(&self, pool: &ResourcePool) -> u32 {
        let nurse_servers = pool.nurses / self.params.nurses_per_server.max(1);
        pool.doctors.saturating_add(nurse_servers).max(1)
    }

    /// Estimated minutes for a `target` patient with `ahead` queued in front, most
    /// urgent first. Rounded to the nearest minute.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn estimate(&self, target: Severity, ahead: &[Severity], pool: &ResourcePool) -> u64 {
        let capacity = f64::from(self.capacity(pool));
        let service = &self.params.service_minutes;
        let queued: f64 = ahead
            .iter()
            .enumerate()
            .map(|(i, sev)| service.value(*sev) / ((i + 1) as f64).min(capacity))
            .sum();
        let total = queued + service.value(target);
        total.max(0.0).round() as u64
    }
}
