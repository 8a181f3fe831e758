//! Bias-Corrected-and-accelerated (BCa) bootstrap.
//!
//! Produces a point estimate and confidence interval for an arbitrary scalar
//! statistic over a sample, degrading gracefully: BCa → bias-corrected
//! percentile → plain percentile → extremal bootstrap values. Every
//! downgrade is recorded in the returned method tag and logged.

use serde::{Deserialize, Serialize};

use crate::numerics::{ndtr, ndtri};
use crate::prng::Prng;

/// Fewest samples for which resampling is considered meaningful.
pub const MIN_BOOTSTRAP_SAMPLES: usize = 30;

/// Fewest expected tail samples for quantile interpolation.
const MIN_TAIL_EXPECTATION: f64 = 5.0;

/// Which interval construction actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiMethod {
    Bca,
    BiasCorrected,
    Percentile,
    Extremal,
}

/// Point estimate with confidence interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BootstrapCi {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
    pub method: CiMethod,
}

/// Hyndman–Fan R6 sample quantile: linear interpolation at index `p·(n+1)`.
/// `sorted` must be ascending and non-empty.
pub fn quantile_r6(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = p * (n as f64 + 1.0);
    if h <= 1.0 {
        return sorted[0];
    }
    if h >= n as f64 {
        return sorted[n - 1];
    }
    let j = h.floor() as usize; // 1-based lower index
    let gamma = h - j as f64;
    sorted[j - 1] + gamma * (sorted[j] - sorted[j - 1])
}

/// Sample median (R6 at p = 1/2 reduces to the usual definition).
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// BCa bootstrap of `theta` over `sample` at the given two-sided confidence
/// level. `rounds` resamples are drawn from `rng` with replacement.
pub fn bca_bootstrap<F>(
    sample: &[f64],
    theta: F,
    confidence: f64,
    rounds: usize,
    rng: &mut Prng,
) -> BootstrapCi
where
    F: Fn(&[f64]) -> f64,
{
    let n = sample.len();
    let estimate = theta(sample);
    let alpha_half = (1.0 - confidence) / 2.0;

    // Resample distribution (needed by every path, including the fallbacks).
    let mut boot = Vec::with_capacity(rounds);
    let mut scratch = vec![0.0f64; n];
    for _ in 0..rounds {
        for slot in scratch.iter_mut() {
            *slot = sample[rng.uniform_range(n as u32) as usize];
        }
        boot.push(theta(&scratch));
    }
    boot.sort_by(|a, b| a.total_cmp(b));

    let extremal = BootstrapCi {
        estimate,
        low: boot[0],
        high: boot[rounds - 1],
        method: CiMethod::Extremal,
    };

    if n < MIN_BOOTSTRAP_SAMPLES
        || (rounds as f64) * alpha_half < MIN_TAIL_EXPECTATION
        || alpha_half <= 0.0
    {
        log::debug!(
            "bootstrap: n = {n}, rounds = {rounds}: interval from extremal values"
        );
        return extremal;
    }

    let percentile = || BootstrapCi {
        estimate,
        low: quantile_r6(&boot, alpha_half),
        high: quantile_r6(&boot, 1.0 - alpha_half),
        method: CiMethod::Percentile,
    };

    // Bias correction from the fraction of resamples at or below the point
    // estimate.
    let below = boot.iter().filter(|&&t| t <= estimate).count();
    let z0 = ndtri(below as f64 / rounds as f64);
    if !z0.is_finite() {
        log::debug!("bootstrap: degenerate bias correction, percentile fallback");
        return contain_or_downgrade(percentile(), percentile(), extremal);
    }

    // Jackknife acceleration.
    let mut jack = Vec::with_capacity(n);
    let mut held_out = Vec::with_capacity(n - 1);
    for i in 0..n {
        held_out.clear();
        held_out.extend_from_slice(&sample[..i]);
        held_out.extend_from_slice(&sample[i + 1..]);
        jack.push(theta(&held_out));
    }
    let jack_mean = jack.iter().sum::<f64>() / n as f64;
    let mut num = 0.0;
    let mut den = 0.0;
    for &j in &jack {
        let d = jack_mean - j;
        num += d * d * d;
        den += d * d;
    }
    let accel = if den > 0.0 {
        num / (6.0 * den.powf(1.5))
    } else {
        0.0
    };
    let method = if den > 0.0 {
        CiMethod::Bca
    } else {
        // Flat jackknife profile: bias-corrected percentile with a = 0.
        CiMethod::BiasCorrected
    };

    let adjusted = |z_alpha: f64| -> f64 {
        let zz = z0 + z_alpha;
        ndtr(z0 + zz / (1.0 - accel * zz))
    };
    let a1 = adjusted(ndtri(alpha_half));
    let a2 = adjusted(ndtri(1.0 - alpha_half));
    if !a1.is_finite() || !a2.is_finite() {
        return contain_or_downgrade(percentile(), percentile(), extremal);
    }

    let ci = BootstrapCi {
        estimate,
        low: quantile_r6(&boot, a1.min(a2)),
        high: quantile_r6(&boot, a1.max(a2)),
        method,
    };
    contain_or_downgrade(ci, percentile(), extremal)
}

/// The interval must contain the point estimate; when it does not, fall back
/// to plain percentile, and from there to extremal values.
fn contain_or_downgrade(
    ci: BootstrapCi,
    percentile: BootstrapCi,
    extremal: BootstrapCi,
) -> BootstrapCi {
    let contains = |c: &BootstrapCi| c.low <= c.estimate && c.estimate <= c.high;
    if contains(&ci) {
        return ci;
    }
    log::debug!(
        "bootstrap: {:?} interval [{}, {}] misses estimate {}, downgrading",
        ci.method,
        ci.low,
        ci.high,
        ci.estimate
    );
    if contains(&percentile) {
        return percentile;
    }
    extremal
}
