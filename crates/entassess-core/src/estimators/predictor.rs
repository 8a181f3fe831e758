//! Shared machinery for the four prediction estimators (SP 800-90B §6.3.7
//! through §6.3.10).
//!
//! Each predictor plays a sequential guessing game; what varies is the
//! state. The entropy derivation is common: a confidence bound on the
//! global hit rate, a run-length bound on local streaks, and the floor of a
//! uniform guess over the alphabet.

use super::{EstimatorKind, EstimatorResult, clamp_entropy, proportion_upper_bound};
use crate::numerics::{close_enough, rel_epsilon_equal};

/// Correct-prediction bookkeeping for one estimator run.
#[derive(Debug, Clone, Default)]
pub struct PredictionTally {
    predictions: u64,
    correct: u64,
    longest_run: u64,
    current_run: u64,
}

impl PredictionTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction outcome.
    pub fn record(&mut self, correct: bool) {
        self.predictions += 1;
        if correct {
            self.correct += 1;
            self.current_run += 1;
            self.longest_run = self.longest_run.max(self.current_run);
        } else {
            self.current_run = 0;
        }
    }

    pub fn predictions(&self) -> u64 {
        self.predictions
    }

    pub fn correct(&self) -> u64 {
        self.correct
    }

    pub fn longest_run(&self) -> u64 {
        self.longest_run
    }

    /// Upper 99% bound on the global hit rate. With zero hits the bound is
    /// the largest rate that would still miss every time with probability
    /// 1%.
    pub fn global_bound(&self) -> f64 {
        let n = self.predictions;
        if n == 0 {
            return 1.0;
        }
        if self.correct == 0 {
            return 1.0 - 0.01f64.powf(1.0 / n as f64);
        }
        proportion_upper_bound(self.correct as f64 / n as f64, n)
    }

    /// The hit probability under which the longest observed streak sits at
    /// the 99th percentile.
    ///
    /// For candidate `p`, the chance of seeing no run of length `r` in `N`
    /// trials is `(1 − p·x) / ((r + 1 − r·x)·q) · x^{−(N+1)}` where `x` is
    /// the smallest positive root of `1 − x + q·pʳ·x^{r+1} = 0`. Bisect `p`
    /// until that chance crosses 0.99.
    pub fn local_bound(&self) -> f64 {
        let n = self.predictions;
        if n == 0 {
            return 0.0;
        }
        let r = self.longest_run + 1;
        let (mut lo, mut hi) = (f64::EPSILON, 1.0 - f64::EPSILON);
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            let chance = no_long_run_probability(mid, r, n);
            if close_enough(chance, 0.99) {
                return mid;
            }
            if chance > 0.99 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    /// Fill a result record from the tally.
    pub fn finish(&self, kind: EstimatorKind, k: usize) -> EstimatorResult {
        let p_global = self.global_bound();
        let p_local = self.local_bound();
        let p = p_global.max(p_local).max(1.0 / k.max(1) as f64);
        log::debug!(
            "{kind}: {}/{} correct, longest run {}, p_global = {p_global:.6}, p_local = {p_local:.6}",
            self.correct,
            self.predictions,
            self.longest_run
        );
        EstimatorResult {
            kind,
            completed: true,
            statistic: if self.predictions == 0 {
                0.0
            } else {
                self.correct as f64 / self.predictions as f64
            },
            upper_bound: p,
            entropy: clamp_entropy(-p.log2(), k),
            runtime_secs: 0.0,
        }
    }
}

/// Probability of no correct-prediction run of length `r` in `n` trials at
/// per-trial hit probability `p`.
fn no_long_run_probability(p: f64, r: u64, n: u64) -> f64 {
    let q = 1.0 - p;
    if q <= 0.0 {
        return 0.0;
    }
    // Smallest positive root of 1 − x + q·pʳ·x^(r+1) = 0, by fixed-point
    // iteration from 1; the coefficient q·pʳ is small so this converges
    // quickly.
    let coeff = q * p.powf(r as f64);
    let mut x = 1.0f64;
    for _ in 0..64 {
        let next = 1.0 + coeff * x.powf(r as f64 + 1.0);
        if rel_epsilon_equal(next, x, 0.0, 1e-15, 2) {
            x = next;
            break;
        }
        x = next;
        if !x.is_finite() {
            return 0.0;
        }
    }
    let head = (1.0 - p * x) / ((r as f64 + 1.0 - r as f64 * x) * q);
    if head <= 0.0 || !head.is_finite() {
        return 0.0;
    }
    // x^(n+1) in log space; x is barely above 1 but n can be millions.
    let value = head.ln() - (n as f64 + 1.0) * x.ln();
    value.exp()
}
