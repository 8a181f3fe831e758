//! Collision estimate for binary data (SP 800-90B §6.3.2).
//!
//! The sequence is cut into collision epochs, each ending at the second
//! occurrence of either symbol. The lower confidence bound on the mean epoch
//! length is inverted through the collision-mean curve to recover the modal
//! probability.

use super::{EstimatorKind, EstimatorResult, Z_995, clamp_entropy};
use crate::numerics::{close_enough, igamc};
use crate::sequence::TranslatedSeq;

/// Expected collision-epoch length for modal probability `p ∈ [0.5, 1)`.
///
/// `F(1/z) = Γ(3, z)·z⁻³·e^z` with `z = 1/q`; `Γ(3, z) = 2·igamc(3, z)`.
fn collision_mean(p: f64) -> f64 {
    let q = 1.0 - p;
    let z = 1.0 / q;
    let f_q = 2.0 * igamc(3.0, z) * q.powi(3) * z.exp();
    let diff = 0.5 * (1.0 / p - 1.0 / q);
    p / (q * q) * (1.0 + diff) * f_q - p / q * diff
}

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    if seq.k != 2 {
        return EstimatorResult::incomplete(EstimatorKind::Collision);
    }
    // Epoch lengths: 2 when a symbol repeats immediately, 3 otherwise.
    let mut v = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut i = 0usize;
    let data = &seq.data;
    while i + 1 < data.len() {
        let len = if data[i] == data[i + 1] {
            2
        } else if i + 2 < data.len() {
            3
        } else {
            break;
        };
        v += 1;
        sum += len as f64;
        sum_sq += (len * len) as f64;
        i += len;
    }
    if v < 2 {
        log::debug!("collision: {v} epochs, too few to estimate");
        return EstimatorResult::incomplete(EstimatorKind::Collision);
    }

    let mean = sum / v as f64;
    let var = (sum_sq - v as f64 * mean * mean) / (v - 1) as f64;
    let mean_low = mean - Z_995 * var.max(0.0).sqrt() / (v as f64).sqrt();

    // Invert the mean curve: F is 2.5 at p = 0.5, decreasing toward 2 as the
    // bias grows.
    let (mut lo, mut hi) = (0.5f64, 1.0 - 1.0 / 512.0);
    let p = if mean_low >= collision_mean(lo) {
        lo
    } else if mean_low <= collision_mean(hi) {
        // Shorter epochs than any modal probability in range explains;
        // saturate at a degenerate source.
        1.0
    } else {
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            let f = collision_mean(mid);
            if close_enough(f, mean_low) {
                lo = mid;
                hi = mid;
                break;
            }
            if f > mean_low {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    };

    EstimatorResult {
        kind: EstimatorKind::Collision,
        completed: true,
        statistic: mean,
        upper_bound: p,
        entropy: clamp_entropy(-p.log2(), seq.k),
        runtime_secs: 0.0,
    }
}
