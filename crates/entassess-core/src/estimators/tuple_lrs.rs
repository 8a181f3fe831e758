//! t-Tuple and Longest-Repeated-Substring estimates (SP 800-90B §6.3.5 and
//! §6.3.6), sharing one suffix array.
//!
//! One monotonic-stack pass over the LCP array yields, per substring length,
//! the highest occurrence count and the number of colliding occurrence
//! pairs. The t-tuple step bounds the modal tuple frequency for lengths
//! where counts stay statistically meaningful (≥ 35); the LRS step bounds
//! the pairwise collision probability for every longer repeated length.

use super::{EstimatorKind, EstimatorResult, clamp_entropy, proportion_upper_bound};
use crate::numerics::choose2;
use crate::sequence::TranslatedSeq;
use crate::suffix::SuffixArray;

/// Minimum occurrence count for a tuple length to enter the t-tuple step.
const TUPLE_CUTOFF: u64 = 35;

/// Per-length substring statistics out of the LCP scan.
struct LengthStats {
    /// `max_count[t]` = occurrences of the most frequent length-`t`
    /// substring (1 when nothing of that length repeats); index 0 unused.
    max_count: Vec<u64>,
    /// `pair_count[t]` = Σ over distinct length-`t` substrings of
    /// C(occurrences, 2); index 0 unused.
    pair_count: Vec<u64>,
}

/// Scan the LCP array once. Each pair of suffixes contributes to exactly the
/// depth equal to the minimum LCP between them; merging suffix groups with a
/// monotonic stack attributes `left·right` cross pairs to the merge depth,
/// and the running group size at depth `d` is the occurrence count of some
/// substring of length `d`.
fn scan_lengths(sa: &SuffixArray) -> LengthStats {
    let v_max = sa.longest_repeat() as usize;
    let mut deepest_count = vec![1u64; v_max + 1];
    let mut exact_pairs = vec![0u64; v_max + 1];

    let mut stack: Vec<(u32, u64)> = Vec::new();
    let n = sa.len();
    for i in 1..=n {
        let h = if i < n { sa.lcp[i] } else { 0 };
        // The suffix left of this boundary joins whatever survives at or
        // below depth h.
        let mut group = 1u64;
        while let Some(&(depth, count)) = stack.last() {
            if depth <= h {
                break;
            }
            stack.pop();
            exact_pairs[depth as usize] += count * group;
            group += count;
            deepest_count[depth as usize] = deepest_count[depth as usize].max(group);
        }
        if h == 0 {
            continue;
        }
        match stack.last_mut() {
            Some(top) if top.0 == h => {
                // The entry keeps absorbing; its size is recorded when it
                // finally pops.
                exact_pairs[h as usize] += top.1 * group;
                top.1 += group;
            }
            _ => stack.push((h, group)),
        }
    }
    debug_assert!(stack.is_empty());

    // A count at depth d is also a count for every shorter length, and a
    // pair colliding at depth d collides at every length ≤ d.
    let mut max_count = deepest_count;
    let mut pair_count = exact_pairs;
    for t in (1..v_max).rev() {
        max_count[t] = max_count[t].max(max_count[t + 1]);
        pair_count[t] += pair_count[t + 1];
    }
    LengthStats {
        max_count,
        pair_count,
    }
}

pub fn estimate(seq: &TranslatedSeq) -> (EstimatorResult, EstimatorResult) {
    let l = seq.len();
    if l < 2 {
        return (
            EstimatorResult::incomplete(EstimatorKind::TTuple),
            EstimatorResult::incomplete(EstimatorKind::Lrs),
        );
    }
    let sa = SuffixArray::build(&seq.data, seq.k);
    let stats = scan_lengths(&sa);
    let v_max = stats.max_count.len() - 1;

    // Largest t where every estimate still rests on ≥ 35 occurrences.
    let t_cutoff = (1..=v_max)
        .rev()
        .find(|&t| stats.max_count[t] >= TUPLE_CUTOFF)
        .unwrap_or(0);

    let tuple = if t_cutoff == 0 {
        log::debug!("t-tuple: no length reaches {TUPLE_CUTOFF} occurrences");
        EstimatorResult::incomplete(EstimatorKind::TTuple)
    } else {
        let mut p_hat = 0.0f64;
        for t in 1..=t_cutoff {
            let p_t = stats.max_count[t] as f64 / (l - t + 1) as f64;
            p_hat = p_hat.max(p_t.powf(1.0 / t as f64));
        }
        let p_u = proportion_upper_bound(p_hat, l as u64);
        EstimatorResult {
            kind: EstimatorKind::TTuple,
            completed: true,
            statistic: t_cutoff as f64,
            upper_bound: p_u,
            entropy: clamp_entropy(-p_u.log2(), seq.k),
            runtime_secs: 0.0,
        }
    };

    // LRS covers the lengths the t-tuple step left behind.
    let u = t_cutoff + 1;
    let lrs = if v_max < u {
        log::debug!("lrs: longest repeat {v_max} below starting length {u}");
        EstimatorResult::incomplete(EstimatorKind::Lrs)
    } else {
        let mut p_hat = 0.0f64;
        for w in u..=v_max {
            let pairs = stats.pair_count[w] as f64 / choose2((l - w + 1) as u64);
            p_hat = p_hat.max(pairs.powf(1.0 / w as f64));
        }
        let p_u = proportion_upper_bound(p_hat, l as u64);
        EstimatorResult {
            kind: EstimatorKind::Lrs,
            completed: true,
            statistic: v_max as f64,
            upper_bound: p_u,
            entropy: clamp_entropy(-p_u.log2(), seq.k),
            runtime_secs: 0.0,
        }
    };

    (tuple, lrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;
    use std::collections::HashMap;

    fn naive_stats(data: &[u32]) -> (Vec<u64>, Vec<u64>) {
        let sa = SuffixArray::build(data, 1 << 9);
        let v_max = sa.longest_repeat() as usize;
        let mut max_count = vec![1u64; v_max + 1];
        let mut pair_count = vec![0u64; v_max + 1];
        for t in 1..=v_max {
            let mut counts: HashMap<&[u32], u64> = HashMap::new();
            for w in data.windows(t) {
                *counts.entry(w).or_insert(0) += 1;
            }
            for &c in counts.values() {
                max_count[t] = max_count[t].max(c);
                pair_count[t] += c * (c - 1) / 2;
            }
        }
        (max_count, pair_count)
    }

    #[test]
    fn scan_matches_naive_window_counts() {
        let mut rng = Prng::from_seed(71);
        for k in [2u32, 4, 16] {
            let data: Vec<u32> = (0..400).map(|_| rng.uniform_range(k)).collect();
            let sa = SuffixArray::build(&data, k as usize);
            let stats = scan_lengths(&sa);
            let (max_naive, pairs_naive) = naive_stats(&data);
            assert_eq!(stats.max_count, max_naive, "k = {k}");
            assert_eq!(stats.pair_count, pairs_naive, "k = {k}");
        }
    }

    #[test]
    fn constant_sequence_collapses() {
        let data = vec![0u32; 200];
        let seq = TranslatedSeq::translate(&data).unwrap();
        let (tuple, lrs) = estimate(&seq);
        assert!(tuple.completed);
        assert_eq!(tuple.entropy, 0.0);
        assert!(lrs.completed);
        assert_eq!(lrs.entropy, 0.0);
    }

    #[test]
    fn alternating_sequence_collapses() {
        let data: Vec<u32> = (0..100_000).map(|i| i % 2).collect();
        let seq = TranslatedSeq::translate(&data).unwrap();
        let (tuple, _) = estimate(&seq);
        assert!(tuple.completed);
        // The two alternating tuples cover every window at every length.
        assert!(tuple.entropy < 0.01, "entropy = {}", tuple.entropy);
    }

    #[test]
    fn uniform_bits_stay_below_one_bit() {
        let mut rng = Prng::from_seed(72);
        let data: Vec<u32> = (0..100_000).map(|_| rng.uniform_range(2)).collect();
        let seq = TranslatedSeq::translate(&data).unwrap();
        let (tuple, lrs) = estimate(&seq);
        assert!(tuple.completed && lrs.completed);
        assert!(tuple.entropy > 0.5 && tuple.entropy <= 1.0, "t-tuple = {}", tuple.entropy);
        assert!(lrs.entropy > 0.5 && lrs.entropy <= 1.0, "lrs = {}", lrs.entropy);
    }

    #[test]
    fn short_input_is_incomplete() {
        let seq = TranslatedSeq::translate(&[1]).unwrap();
        let (tuple, lrs) = estimate(&seq);
        assert!(!tuple.completed && !lrs.completed);
    }
}
