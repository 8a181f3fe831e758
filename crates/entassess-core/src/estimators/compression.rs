//! Compression (Maurer universal statistic) estimate for binary data
//! (SP 800-90B §6.3.4).
//!
//! Bits are packed into 6-bit blocks; after a 1000-block dictionary warm-up
//! the statistic is the average log2 gap since each block value was last
//! seen. The lower confidence bound on that average is inverted through the
//! expected-value curve of a near-degenerate block distribution.

use super::{EstimatorKind, EstimatorResult, Z_995, clamp_entropy};
use crate::numerics::{AdaptiveSum, close_enough};
use crate::sequence::TranslatedSeq;

/// Bits per block.
pub(crate) const BLOCK_BITS: usize = 6;

/// Dictionary warm-up blocks.
const INIT_BLOCKS: usize = 1000;

/// Maurer's asymptotic standard-deviation factor for 6-bit blocks.
const SIGMA_FACTOR: f64 = 0.5907;

/// Expected average log2 gap when one block value has probability `z` and
/// the test spans `num_blocks` blocks with `v` scored ones.
///
/// `G(z) = (1/v)·Σ_{t=d+1}^{nb} Σ_{u=1}^{t} log2(u)·F(z,t,u)` with
/// `F(z,t,u) = z²(1−z)^{u−1}` for `u < t` and `z(1−z)^{t−1}` at `u = t`,
/// regrouped into a single pass over `u`.
fn expected_log_gap(z: f64, v: u64, num_blocks: usize) -> f64 {
    if z <= 0.0 {
        return 0.0;
    }
    let nb = num_blocks as u64;
    let d = INIT_BLOCKS as u64;
    let mut acc = AdaptiveSum::new();
    let mut pow = 1.0f64; // (1−z)^(u−1)
    for u in 1..=nb {
        if pow == 0.0 {
            break;
        }
        let log_u = (u as f64).log2();
        if u <= d {
            acc.add(v as f64 * log_u * z * z * pow);
        } else {
            if u < nb {
                acc.add((nb - u) as f64 * log_u * z * z * pow);
            }
            acc.add(log_u * z * pow);
        }
        pow *= 1.0 - z;
    }
    acc.result() / v as f64
}

/// The full curve: the modal block value at probability `p`, the other 63
/// values sharing the remainder evenly.
fn mean_curve(p: f64, v: u64, num_blocks: usize) -> f64 {
    let q = (1.0 - p) / 63.0;
    expected_log_gap(p, v, num_blocks) + 63.0 * expected_log_gap(q, v, num_blocks)
}

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    if seq.k != 2 {
        return EstimatorResult::incomplete(EstimatorKind::Compression);
    }
    let num_blocks = seq.len() / BLOCK_BITS;
    if num_blocks < INIT_BLOCKS + 2 {
        log::debug!("compression: {num_blocks} blocks, below the warm-up size");
        return EstimatorResult::incomplete(EstimatorKind::Compression);
    }

    // Pack 6 bits per block, MSB first.
    let blocks: Vec<usize> = seq
        .data
        .chunks_exact(BLOCK_BITS)
        .map(|c| c.iter().fold(0usize, |acc, &b| acc << 1 | b as usize))
        .collect();

    // 1-based last-occurrence positions; 0 marks unseen.
    let mut last = [0u64; 1 << BLOCK_BITS];
    for (i, &b) in blocks[..INIT_BLOCKS].iter().enumerate() {
        last[b] = i as u64 + 1;
    }

    let v = (num_blocks - INIT_BLOCKS) as u64;
    let mut sum = AdaptiveSum::new();
    let mut sum_sq = AdaptiveSum::new();
    for (i, &b) in blocks.iter().enumerate().skip(INIT_BLOCKS) {
        let pos = i as u64 + 1;
        let dist = if last[b] == 0 { pos } else { pos - last[b] };
        last[b] = pos;
        let t = (dist as f64).log2();
        sum.add(t);
        sum_sq.add(t * t);
    }
    let mean = sum.result() / v as f64;
    let var = (sum_sq.result() / v as f64 - mean * mean).max(0.0);
    let sigma = SIGMA_FACTOR * var.sqrt();
    let mean_low = mean - Z_995 * sigma / (v as f64).sqrt();

    // Invert the curve over p ∈ [2⁻⁶, 1); it decreases from the uniform
    // expectation toward zero.
    let (mut lo, mut hi) = (1.0 / 64.0, 1.0 - f64::EPSILON);
    let p = if mean_low >= mean_curve(lo, v, num_blocks) {
        lo
    } else if mean_low <= mean_curve(hi, v, num_blocks) {
        1.0
    } else {
        for _ in 0..60 {
            let mid = 0.5 * (lo + hi);
            let g = mean_curve(mid, v, num_blocks);
            if close_enough(g, mean_low) {
                lo = mid;
                hi = mid;
                break;
            }
            if g > mean_low {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    };

    // Per-bit entropy: the block holds 6 bits.
    let entropy = clamp_entropy(-p.log2() / BLOCK_BITS as f64, seq.k);
    EstimatorResult {
        kind: EstimatorKind::Compression,
        completed: true,
        statistic: mean,
        upper_bound: p,
        entropy,
        runtime_secs: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    #[test]
    fn too_few_blocks_is_incomplete() {
        let raw: Vec<u32> = (0..600).map(|i| i % 2).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        assert!(!estimate(&seq).completed);
    }

    #[test]
    fn uniform_bits_score_high() {
        let mut rng = Prng::from_seed(61);
        let raw: Vec<u32> = (0..120_000).map(|_| rng.uniform_range(2)).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!(r.completed);
        // Uniform 6-bit blocks: average log gap near log2 of the 64-value
        // recurrence time.
        assert!(r.statistic > 4.5 && r.statistic < 6.0, "mean = {}", r.statistic);
        assert!(r.entropy > 0.6 && r.entropy <= 1.0, "entropy = {}", r.entropy);
    }

    #[test]
    fn constant_bits_score_zero() {
        let raw = vec![1u32; 60_000];
        // Force a binary alphabet with a single leading zero.
        let mut with_zero = vec![0u32];
        with_zero.extend_from_slice(&raw);
        let seq = TranslatedSeq::translate(&with_zero).unwrap();
        let r = estimate(&seq);
        assert!(r.completed);
        assert!(r.entropy < 0.01, "entropy = {}", r.entropy);
    }

    #[test]
    fn biased_bits_score_below_uniform() {
        let mut rng = Prng::from_seed(62);
        let uniform: Vec<u32> = (0..120_000).map(|_| rng.uniform_range(2)).collect();
        let biased: Vec<u32> = (0..120_000)
            .map(|_| u32::from(rng.uniform_unit() >= 0.8))
            .collect();
        let hu = estimate(&TranslatedSeq::translate(&uniform).unwrap()).entropy;
        let hb = estimate(&TranslatedSeq::translate(&biased).unwrap()).entropy;
        assert!(hb < hu, "biased {hb} vs uniform {hu}");
    }

    #[test]
    fn curve_is_monotone_decreasing() {
        let v = 5000;
        let nb = 6000;
        let mut prev = f64::INFINITY;
        for p in [1.0 / 64.0, 0.1, 0.3, 0.6, 0.9, 0.999] {
            let g = mean_curve(p, v, nb);
            assert!(g < prev, "p = {p}: {g} !< {prev}");
            prev = g;
        }
    }
}
