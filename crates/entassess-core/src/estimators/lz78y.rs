//! LZ78Y prediction estimate (SP 800-90B §6.3.10).
//!
//! A bounded dictionary of observed prefixes (up to 16 symbols long); each
//! step predicts with the longest stored prefix whose most frequent
//! continuation is known.

use super::predictor::PredictionTally;
use super::{EstimatorKind, EstimatorResult};
use crate::dict_tree::DictTree;
use crate::sequence::TranslatedSeq;

/// Longest prefix tracked.
const MAX_PREFIX: usize = 16;

/// Dictionary capacity in stored prefixes.
const MAX_DICT: u32 = 65_536;

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    let data = &seq.data;
    let l = data.len();
    if l < MAX_PREFIX + 2 {
        log::debug!("lz78y: {l} symbols, below the prefix horizon");
        return EstimatorResult::incomplete(EstimatorKind::Lz78y);
    }

    let mut tree = DictTree::new();
    let mut entries = 0u32;
    let mut tally = PredictionTally::new();

    for i in MAX_PREFIX + 1..l {
        // Longest stored prefix ending at i−1, walking the reversed history;
        // deeper matches overwrite shallower predictions.
        let mut prediction = None;
        let mut node = DictTree::ROOT;
        for j in 1..=MAX_PREFIX {
            match tree.child(node, data[i - j]) {
                Some(child) => {
                    node = child;
                    if let Some((sym, _)) = tree.max_entry(child) {
                        prediction = Some(sym);
                    }
                }
                None => break,
            }
        }

        let sym = data[i];
        tally.record(prediction == Some(sym));

        // Record the continuation under every prefix length, adding new
        // prefixes while the dictionary has room.
        let mut node = DictTree::ROOT;
        for j in 1..=MAX_PREFIX {
            let back = data[i - j];
            let next = match tree.child(node, back) {
                Some(child) => child,
                None => {
                    if entries >= MAX_DICT {
                        break;
                    }
                    match tree.child_or_create(node, back) {
                        Some(child) => child,
                        None => break,
                    }
                }
            };
            if tree.prefix_found(next) {
                tree.record(next, sym);
            } else if entries < MAX_DICT {
                tree.record(next, sym);
                entries += 1;
            }
            node = next;
        }
    }

    tally.finish(EstimatorKind::Lz78y, seq.k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Prng;

    #[test]
    fn short_input_is_incomplete() {
        let raw: Vec<u32> = (0..17).map(|i| i % 2).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        assert!(!estimate(&seq).completed);
    }

    #[test]
    fn repeated_text_is_fully_predicted() {
        let pattern = [2u32, 7, 1, 8, 2, 8];
        let raw: Vec<u32> = (0..30_000).map(|i| pattern[i % pattern.len()]).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!(r.completed);
        assert!(r.statistic > 0.99, "hit rate = {}", r.statistic);
        assert!(r.entropy < 0.01, "entropy = {}", r.entropy);
    }

    #[test]
    fn uniform_bits_stay_near_one_bit() {
        let mut rng = Prng::from_seed(111);
        let raw: Vec<u32> = (0..100_000).map(|_| rng.uniform_range(2)).collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!((r.statistic - 0.5).abs() < 0.02, "hit rate = {}", r.statistic);
        assert!(r.entropy > 0.9 && r.entropy <= 1.0, "entropy = {}", r.entropy);
    }

    #[test]
    fn biased_bits_score_low_entropy() {
        let mut rng = Prng::from_seed(112);
        let raw: Vec<u32> = (0..100_000)
            .map(|_| u32::from(rng.uniform_unit() >= 0.85))
            .collect();
        let seq = TranslatedSeq::translate(&raw).unwrap();
        let r = estimate(&seq);
        assert!(r.statistic > 0.8, "hit rate = {}", r.statistic);
        assert!(r.entropy < 0.35, "entropy = {}", r.entropy);
    }
}
