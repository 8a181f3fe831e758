//! The ten min-entropy estimators of SP 800-90B §6.3.
//!
//! Every estimator consumes a translated sequence and fills a result record
//! with the raw statistic, the bounded probability it derives, the
//! per-symbol min-entropy, and a runtime measurement. An estimator that
//! cannot run on the given data (too short, wrong alphabet) reports
//! `completed = false` and is excluded from the assessed minimum.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::sequence::TranslatedSeq;

pub mod collision;
pub mod compression;
pub mod lag;
pub mod lz78y;
pub mod markov;
pub mod mcv;
pub mod multi_mcw;
pub mod multi_mmc;
pub mod predictor;
pub mod tuple_lrs;

/// z-score for the upper 99% one-sided confidence bound (Φ⁻¹(0.995)).
pub const Z_995: f64 = 2.575_829_303_548_901;

/// The estimator family, one bit each for subset selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    MostCommonValue,
    Collision,
    Markov,
    Compression,
    TTuple,
    Lrs,
    MultiMcw,
    Lag,
    MultiMmc,
    Lz78y,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 10] = [
        Self::MostCommonValue,
        Self::Collision,
        Self::Markov,
        Self::Compression,
        Self::TTuple,
        Self::Lrs,
        Self::MultiMcw,
        Self::Lag,
        Self::MultiMmc,
        Self::Lz78y,
    ];

    /// Position in the selection bitmask.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MostCommonValue => "most common value",
            Self::Collision => "collision",
            Self::Markov => "markov",
            Self::Compression => "compression",
            Self::TTuple => "t-tuple",
            Self::Lrs => "longest repeated substring",
            Self::MultiMcw => "multi most common in window",
            Self::Lag => "lag prediction",
            Self::MultiMmc => "multi markov model with counting",
            Self::Lz78y => "lz78y prediction",
        }
    }

    /// Whether the estimator is defined only for binary alphabets.
    pub fn binary_only(self) -> bool {
        matches!(self, Self::Collision | Self::Markov | Self::Compression)
    }

    /// Per-symbol min-entropy implied by this estimator's probability
    /// parameter. Markov's parameter spans a 128-step path and
    /// Compression's a 6-bit block; both rescale to bits per symbol.
    pub fn parameter_entropy(self, p: f64) -> f64 {
        let bits = -p.max(f64::MIN_POSITIVE).log2();
        match self {
            Self::Markov => bits / f64::from(markov::PATH_LEN),
            Self::Compression => bits / compression::BLOCK_BITS as f64,
            _ => bits,
        }
    }
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One estimator's numerical evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorResult {
    pub kind: EstimatorKind,
    /// Whether the estimator ran to completion on this data.
    pub completed: bool,
    /// The raw statistic (count, ratio, mean, or log-probability).
    pub statistic: f64,
    /// The bounded probability the entropy derives from, where applicable.
    pub upper_bound: f64,
    /// Per-symbol min-entropy in bits.
    pub entropy: f64,
    /// Wall-clock runtime in seconds.
    pub runtime_secs: f64,
}

impl EstimatorResult {
    pub fn incomplete(kind: EstimatorKind) -> Self {
        Self {
            kind,
            completed: false,
            statistic: f64::NAN,
            upper_bound: f64::NAN,
            entropy: 0.0,
            runtime_secs: 0.0,
        }
    }
}

/// Upper 99% one-sided binomial-normal bound on a proportion, clipped to 1.
pub(crate) fn proportion_upper_bound(p_hat: f64, n: u64) -> f64 {
    if n < 2 {
        return 1.0;
    }
    (p_hat + Z_995 * (p_hat * (1.0 - p_hat) / (n - 1) as f64).sqrt()).min(1.0)
}

/// Clamp a derived entropy into `[0, log2(k)]`.
pub(crate) fn clamp_entropy(h: f64, k: usize) -> f64 {
    h.clamp(0.0, (k.max(1) as f64).log2())
}

/// Run the selected estimators over one translated sequence.
///
/// Binary-only estimators are skipped (without a record) when `k != 2`.
/// Result order follows [`EstimatorKind::ALL`].
pub fn run_all(seq: &TranslatedSeq, bitmask: u32) -> Vec<EstimatorResult> {
    let mut results = Vec::new();
    for kind in EstimatorKind::ALL {
        if bitmask & kind.bit() == 0 {
            continue;
        }
        if kind.binary_only() && seq.k != 2 {
            log::debug!("{kind}: skipped, alphabet size {} is not binary", seq.k);
            continue;
        }
        // t-tuple and LRS share one suffix array; when both are selected
        // the records come out of the t-tuple dispatch.
        if kind == EstimatorKind::Lrs {
            if bitmask & EstimatorKind::TTuple.bit() == 0 {
                let start = Instant::now();
                let (_, mut lrs) = tuple_lrs::estimate(seq);
                lrs.runtime_secs = start.elapsed().as_secs_f64();
                results.push(lrs);
            }
            continue;
        }
        let start = Instant::now();
        if kind == EstimatorKind::TTuple {
            let (mut tuple, mut lrs) = tuple_lrs::estimate(seq);
            let elapsed = start.elapsed().as_secs_f64();
            tuple.runtime_secs = elapsed;
            lrs.runtime_secs = elapsed;
            results.push(tuple);
            if bitmask & EstimatorKind::Lrs.bit() != 0 {
                results.push(lrs);
            }
            continue;
        }
        let mut record = match kind {
            EstimatorKind::MostCommonValue => mcv::estimate(seq),
            EstimatorKind::Collision => collision::estimate(seq),
            EstimatorKind::Markov => markov::estimate(seq),
            EstimatorKind::Compression => compression::estimate(seq),
            EstimatorKind::MultiMcw => multi_mcw::estimate(seq),
            EstimatorKind::Lag => lag::estimate(seq),
            EstimatorKind::MultiMmc => multi_mmc::estimate(seq),
            EstimatorKind::Lz78y => lz78y::estimate(seq),
            EstimatorKind::TTuple | EstimatorKind::Lrs => unreachable!(),
        };
        record.runtime_secs = start.elapsed().as_secs_f64();
        log::debug!(
            "{kind}: entropy = {:.6}, completed = {}",
            record.entropy,
            record.completed
        );
        results.push(record);
    }
    results
}

/// Minimum entropy across the completed records, the assessed value for one
/// dataset. `None` when nothing completed.
pub fn assessed_entropy(results: &[EstimatorResult]) -> Option<f64> {
    results
        .iter()
        .filter(|r| r.completed)
        .map(|r| r.entropy)
        .min_by(|a, b| a.total_cmp(b))
}
