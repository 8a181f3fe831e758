//! Multi Markov-Model-with-Counting prediction estimate (SP 800-90B
//! §6.3.9).
//!
//! Sixteen subpredictors track contexts of depth 1..16 in one dictionary
//! tree; each predicts the most frequent continuation of its context and
//! the scoreboard follows the deepest consistently-right depth.

use super::predictor::PredictionTally;
use super::{EstimatorKind, EstimatorResult};
use crate::dict_tree::DictTree;
use crate::sequence::TranslatedSeq;

const MAX_DEPTH: usize = 16;

/// Stored contexts per depth before new ones are dropped.
const MAX_ENTRIES: u32 = 100_000;

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    let data = &seq.data;
    let l = data.len();
    if l < 3 {
        return EstimatorResult::incomplete(EstimatorKind::MultiMmc);
    }

    let mut tree = DictTree::new();
    let mut entries = [0u32; MAX_DEPTH + 1];
    let mut scores = [0u64; MAX_DEPTH];
    let mut winner = 0usize; // index = depth − 1
    let mut tally = PredictionTally::new();
    let mut predictions = [None::<u32>; MAX_DEPTH];

    // The first observation only primes the depth-1 context; predictions
    // start at the third symbol.
    for i in 2..l {
        // Walk the reversed history; the node at depth d is the context of
        // the last d symbols.
        predictions.fill(None);
        let mut node = DictTree::ROOT;
        for d in 1..=MAX_DEPTH.min(i) {
            match tree.child(node, data[i - d]) {
                Some(child) => {
                    node = child;
                    predictions[d - 1] = tree.max_entry(node).map(|(sym, _)| sym);
                }
                None => break,
            }
        }

        let sym = data[i];
        tally.record(predictions[winner] == Some(sym));
        for (d, &pred) in predictions.iter().enumerate() {
            if pred == Some(sym) {
                scores[d] += 1;
                // Ties promote toward the deeper context.
                if scores[d] >= scores[winner] {
                    winner = d;
                }
            }
        }

        // Update every context depth with the observed continuation,
        // creating contexts until the per-depth budget is spent.
        let mut node = DictTree::ROOT;
        for d in 1..=MAX_DEPTH.min(i) {
            let back = data[i - d];
            let next = match tree.child(node, back) {
                Some(child) => child,
                None => {
                    if entries[d] >= MAX_ENTRIES {
                        break;
                    }
                    match tree.child_or_create(node, back) {
                        Some(child) => {
                            entries[d] += 1;
                            child
                        }
                        None => break,
                    }
                }
            };
            tree.record(next, sym);
            node = next;
        }
    }

    tally.finish(EstimatorKind::MultiMmc, seq.k)
}
