//! Markov estimate for binary data (SP 800-90B §6.3.3).
//!
//! Fits a first-order chain, pushes the initial and transition probabilities
//! to their 99% confidence bounds, and takes the most probable 128-step path
//! through the bounded chain in log2 arithmetic.

use super::{EstimatorKind, EstimatorResult, clamp_entropy, proportion_upper_bound};
use crate::sequence::TranslatedSeq;

/// Path length the chain is unrolled to.
pub(crate) const PATH_LEN: u32 = 128;

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    let data = &seq.data;
    let l = data.len();
    if seq.k != 2 || l < 2 {
        return EstimatorResult::incomplete(EstimatorKind::Markov);
    }

    let zeros = data.iter().filter(|&&s| s == 0).count() as u64;
    let p0_u = proportion_upper_bound(zeros as f64 / l as f64, l as u64);
    let p1_u = proportion_upper_bound((l as u64 - zeros) as f64 / l as f64, l as u64);

    // Transition counts over the L−1 adjacent pairs.
    let mut trans = [[0u64; 2]; 2];
    for w in data.windows(2) {
        trans[w[0] as usize][w[1] as usize] += 1;
    }
    // Bound P(to | from); an unobserved source state gets the vacuous bound.
    let bound = |from: usize, to: usize| -> f64 {
        let n = trans[from][0] + trans[from][1];
        if n == 0 {
            return 1.0;
        }
        proportion_upper_bound(trans[from][to] as f64 / n as f64, n)
    };
    let p00 = bound(0, 0);
    let p01 = bound(0, 1);
    let p10 = bound(1, 0);
    let p11 = bound(1, 1);

    // The most probable 128-step path is one of six shapes: stay in a state,
    // alternate, or hop once and stay. Max-plus over log2 probabilities.
    let lp = |p: f64| p.log2();
    let half = (PATH_LEN / 2) as f64;
    let stay = (PATH_LEN - 1) as f64;
    let candidates = [
        lp(p0_u) + stay * lp(p00),
        lp(p0_u) + half * lp(p01) + (half - 1.0) * lp(p10),
        lp(p0_u) + lp(p01) + (stay - 1.0) * lp(p11),
        lp(p1_u) + lp(p10) + (stay - 1.0) * lp(p00),
        lp(p1_u) + half * lp(p10) + (half - 1.0) * lp(p01),
        lp(p1_u) + stay * lp(p11),
    ];
    let max_log = candidates
        .iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0);

    let entropy = clamp_entropy(-max_log / PATH_LEN as f64, seq.k);
    EstimatorResult {
        kind: EstimatorKind::Markov,
        completed: true,
        statistic: max_log,
        upper_bound: max_log.exp2(),
        entropy,
        runtime_secs: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    fn bits(raw: &[u32]) -> TranslatedSeq {
        TranslatedSeq::translate(raw).unwrap()
    }

    #[test]
    fn uniform_bits_estimate_near_one() {
        let mut rng = Prng::from_seed(51);
        let raw: Vec<u32> = (0..500_000).map(|_| rng.uniform_range(2)).collect();
        let r = estimate(&bits(&raw));
        assert!(r.completed);
        assert!(r.entropy > 0.97 && r.entropy <= 1.0, "entropy = {}", r.entropy);
    }

    #[test]
    fn alternating_bits_collapse() {
        let raw: Vec<u32> = (0..100_000).map(|i| i % 2).collect();
        let r = estimate(&bits(&raw));
        // P(0|1) and P(1|0) bound to 1; the alternating path dominates.
        assert!(r.entropy < 0.01, "entropy = {}", r.entropy);
    }

    #[test]
    fn correlated_bits_estimate_below_mcv() {
        // Pr(same as previous) = 0.75: the stay-in-state path binds around
        // −log2(0.75) ≈ 0.415 per step.
        let mut rng = Prng::from_seed(52);
        let mut raw = Vec::with_capacity(500_000);
        raw.push(0u32);
        for _ in 1..500_000 {
            let prev = *raw.last().unwrap();
            let same = rng.uniform_unit() < 0.75;
            raw.push(if same { prev } else { 1 - prev });
        }
        let r = estimate(&bits(&raw));
        assert!(r.entropy > 0.35 && r.entropy < 0.52, "entropy = {}", r.entropy);
    }

    #[test]
    fn length_one_is_incomplete() {
        let seq = TranslatedSeq::translate(&[0]).unwrap();
        assert!(!estimate(&seq).completed);
    }
}
