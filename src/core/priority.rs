//! Wait-aware priority scoring.
//!
//! `score = base + wait * boost + overflow`, where the overflow term
//! `(wait - ceiling)^2 / divisor` only applies once an entry has waited past its
//! tier's ceiling. The quadratic term is what lets a long-waiting low-tier entry
//! eventually outrank any fresh arrival.

use crate::config::PriorityConfig;
use crate::core::Severity;

/// Pure scoring function over severity and minutes waited.
#[derive(Debug, Clone, Default)]
pub struct PriorityFunction {
    params: PriorityConfig,
}

impl PriorityFunction {
    /// Create a scoring function from tunables.
    #[must_use]
    pub const fn new(params: PriorityConfig) -> Self {
        Self { params }
    }

    /// Borrow the tunables.
    #[must_use]
    pub const fn params(&self) -> &PriorityConfig {
        &self.params
    }

    /// Priority score for an entry of `severity` that has waited `wait_minutes`.
    /// Negative waits are treated as zero.
    #[must_use]
    pub fn score(&self, severity: Severity, wait_minutes: f64) -> f64 {
        let wait = wait_minutes.max(0.0);
        let p = &self.params;
        let mut score =
            p.base_score.value(severity) + wait * p.boost_per_minute.value(severity);
        let ceiling = p.wait_ceiling_minutes.value(severity);
        if wait > ceiling {
            let overage = wait - ceiling;
            score += overage * overage / p.overflow_divisor;
        }
        score
    }

    /// Smallest wait (to 0.01 minute) at which an entry of severity `waiting` scores
    /// at least as high as a brand-new entry of severity `fresh`.
    ///
    /// Returns `None` only if the waiting tier has neither boost nor a finite
    /// ceiling and starts below the fresh tier.
    #[must_use]
    pub fn overtake_wait_minutes(&self, waiting: Severity, fresh: Severity) -> Option<f64> {
        let target = self.score(fresh, 0.0);
        if self.score(waiting, 0.0) >= target {
            return Some(0.0);
        }
        let mut hi = 1.0_f64;
        while self.score(waiting, hi) < target {
            hi *= 2.0;
            if !hi.is_finite() || hi > 1.0e9 {
                return None;
            }
        }
        let mut lo = 0.0_f64;
        while hi - lo > 0.01 {
            let mid = (lo + hi) / 2.0;
            if self.score(waiting, mid) >= target {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Some(hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f() -> PriorityFunction {
        PriorityFunction::default()
    }

    #[test]
    fn base_scores_at_zero_wait() {
        assert!((f().score(Severity::Critical, 0.0) - 100.0).abs() < 1e-9);
        assert!((f().score(Severity::Moderate, 0.0) - 50.0).abs() < 1e-9);
        assert!((f().score(Severity::Normal, 0.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn overflow_applies_past_ceiling() {
        // 10 + 65 * 0.5 + 5^2 / 10
        assert!((f().score(Severity::Normal, 65.0) - 45.0).abs() < 1e-9);
        // exactly at the ceiling there is no overflow term
        assert!((f().score(Severity::Moderate, 30.0) - 80.0).abs() < 1e-9);
        // 100 + 12 * 2 + 2^2 / 10
        assert!((f().score(Severity::Critical, 12.0) - 124.4).abs() < 1e-9);
    }

    #[test]
    fn score_is_non_decreasing_in_wait() {
        let f = f();
        for severity in Severity::ALL {
            let mut prev = f.score(severity, 0.0);
            for step in 1..=2_000 {
                let next = f.score(severity, f64::from(step) * 0.25);
                assert!(next >= prev, "{severity} decreased at step {step}");
                prev = next;
            }
        }
    }

    #[test]
    fn negative_wait_clamps() {
        assert!((f().score(Severity::Normal, -5.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn normal_eventually_outranks_fresh_critical() {
        let f = f();
        let t = f.overtake_wait_minutes(Severity::Normal, Severity::Critical).unwrap();
        assert!(t > 60.0 && t < 120.0, "overtake at {t}");
        assert!(f.score(Severity::Normal, t) >= f.score(Severity::Critical, 0.0));
        assert!(f.score(Severity::Normal, t - 0.05) < f.score(Severity::Critical, 0.0));
        assert_eq!(
            f.overtake_wait_minutes(Severity::Critical, Severity::Normal),
            Some(0.0)
        );
    }
}
