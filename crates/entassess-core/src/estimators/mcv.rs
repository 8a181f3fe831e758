//! Most-Common Value estimate (SP 800-90B §6.3.1).
//!
//! The frequency of the modal symbol, pushed up to its 99% one-sided
//! confidence bound. Runs on any alphabet and any length, so it is the one
//! estimator that always participates.

use super::{EstimatorKind, EstimatorResult, clamp_entropy, proportion_upper_bound};
use crate::sequence::TranslatedSeq;

pub fn estimate(seq: &TranslatedSeq) -> EstimatorResult {
    let l = seq.len();
    let mut counts = vec![0u64; seq.k];
    for &s in &seq.data {
        counts[s as usize] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0);
    let p_hat = max_count as f64 / l as f64;
    let p_u = proportion_upper_bound(p_hat, l as u64);
    EstimatorResult {
        kind: EstimatorKind::MostCommonValue,
        completed: true,
        statistic: p_hat,
        upper_bound: p_u,
        entropy: clamp_entropy(-p_u.log2(), seq.k),
        runtime_secs: 0.0,
    }
}
