//! Full-dataset assessment: block partitioning, parallel estimator
//! dispatch, and aggregation of per-block results into one min-entropy
//! figure.
//!
//! Blocks are assessed independently on a small worker pool pulling block
//! indices from a shared counter; result order is preserved. The enabled
//! aggregation strategies each produce a candidate figure and the final
//! assessment is their minimum.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::bootstrap::{BootstrapCi, MIN_BOOTSTRAP_SAMPLES, bca_bootstrap, median};
use crate::config::{AssessmentConfig, EvalMode};
use crate::error::{Error, Result};
use crate::estimators::{self, EstimatorResult};
use crate::prng::{DETERMINISTIC_SEED, Prng, sub_seed};
use crate::sequence::{Bitstring, TranslatedSeq, serial_xor};

/// Fewest blocks for the parameter bootstrap to be meaningful.
pub const MIN_PARAM_BOOTSTRAP_BLOCKS: usize = 139;

/// Which aggregation produced a candidate figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    BlockMinimum,
    MedianAssessment,
    ParameterBootstrap,
    AssessmentBootstrap,
    LargeBlock,
}

/// One enabled strategy's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub kind: AggregationKind,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci: Option<BootstrapCi>,
}

/// Estimator results for one block (or the whole dataset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAssessment {
    pub index: usize,
    /// Minimum across the raw-sequence estimators.
    pub h_original: Option<f64>,
    /// Minimum across the bitstring estimators, per bit.
    pub h_bitstring: Option<f64>,
    /// Active bit positions of the block's symbols.
    pub bit_width: u32,
    /// Per-symbol assessed entropy for this block.
    pub assessed: f64,
    pub results: Vec<EstimatorResult>,
    pub bit_results: Vec<EstimatorResult>,
}

/// The whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub symbol_count: usize,
    pub alphabet_size: usize,
    /// True when the data has fewer than two distinct symbols; the
    /// assessment is 0 and the caller should exit non-zero.
    pub degenerate: bool,
    pub blocks: Vec<BlockAssessment>,
    pub strategies: Vec<StrategyOutcome>,
    /// Index of the block closest to the median assessment, when the median
    /// report is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_block: Option<usize>,
    /// The final figure: minimum across enabled strategies.
    pub assessed_entropy: f64,
}

impl AssessmentReport {
    fn degenerate(symbol_count: usize, alphabet_size: usize) -> Self {
        Self {
            symbol_count,
            alphabet_size,
            degenerate: true,
            blocks: Vec::new(),
            strategies: Vec::new(),
            median_block: None,
            assessed_entropy: 0.0,
        }
    }

    /// The standard per-run text record.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let h_orig = self
            .blocks
            .iter()
            .filter_map(|b| b.h_original)
            .min_by(|a, b| a.total_cmp(b));
        let h_bits = self
            .blocks
            .iter()
            .filter_map(|b| b.h_bitstring)
            .min_by(|a, b| a.total_cmp(b));
        if let Some(h) = h_orig {
            out.push_str(&format!("H_original = {h:.6}\n"));
        }
        if let Some(h) = h_bits {
            out.push_str(&format!("H_bitstring = {h:.6}\n"));
        }
        out.push_str(&format!(
            "Assessed min entropy = {:.6}\n",
            self.assessed_entropy
        ));
        out
    }
}

/// Assess a raw symbol buffer under the given configuration.
pub fn assess(raw: &[u32], config: &AssessmentConfig) -> Result<AssessmentReport> {
    config.validate()?;
    if raw.is_empty() {
        return Err(Error::InvalidInput("empty symbol sequence".to_string()));
    }
    let data = serial_xor(raw, config.serial_xor);
    if data.is_empty() {
        return Err(Error::InvalidInput(
            "serial xor folding consumed the whole sequence".to_string(),
        ));
    }
    let whole = TranslatedSeq::translate(&data)?;
    if whole.k < 2 {
        log::warn!("degenerate input: a single distinct symbol, entropy is 0");
        return Ok(AssessmentReport::degenerate(data.len(), whole.k));
    }

    let master_seed = if config.deterministic {
        DETERMINISTIC_SEED
    } else {
        Prng::from_os_entropy().uniform_u64()
    };

    // Block layout: disjoint prefix blocks, a trailing remainder is dropped.
    let block_len = if config.block_size > 0 && data.len() >= config.block_size {
        config.block_size
    } else {
        data.len()
    };
    let block_count = data.len() / block_len;
    log::debug!(
        "assessing {} symbols (k = {}) in {block_count} block(s) of {block_len}",
        data.len(),
        whole.k
    );

    let blocks = assess_blocks(&data, block_len, block_count, config)?;
    if blocks
        .iter()
        .all(|b| b.h_original.is_none() && b.h_bitstring.is_none())
    {
        return Err(Error::InsufficientData(
            "no selected estimator completed on any block".to_string(),
        ));
    }

    // Aggregation strategies; the block minimum is always on.
    let mut strategies = Vec::new();
    let assessed: Vec<f64> = blocks.iter().map(|b| b.assessed).collect();
    let block_min = assessed
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0);
    strategies.push(StrategyOutcome {
        kind: AggregationKind::BlockMinimum,
        value: block_min,
        ci: None,
    });

    let mut median_block = None;
    if config.median_report {
        if blocks.len() < MIN_BOOTSTRAP_SAMPLES {
            log::warn!(
                "median assessment disabled: {} blocks, need {MIN_BOOTSTRAP_SAMPLES}",
                blocks.len()
            );
        } else {
            let mut rng = Prng::from_seed(sub_seed(master_seed, u64::MAX, 1));
            let ci = bca_bootstrap(
                &assessed,
                sorted_median,
                config.bootstrap_confidence,
                config.bootstrap_rounds,
                &mut rng,
            );
            median_block = assessed
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (*a - ci.estimate).abs().total_cmp(&(*b - ci.estimate).abs())
                })
                .map(|(i, _)| i);
            strategies.push(StrategyOutcome {
                kind: AggregationKind::MedianAssessment,
                value: ci.estimate,
                ci: Some(ci),
            });
        }
    }

    if config.bootstrap_assessments {
        if blocks.len() < MIN_BOOTSTRAP_SAMPLES {
            log::warn!(
                "assessment bootstrap disabled: {} blocks, need {MIN_BOOTSTRAP_SAMPLES}",
                blocks.len()
            );
        } else {
            let mut rng = Prng::from_seed(sub_seed(master_seed, u64::MAX, 2));
            let ci = bca_bootstrap(
                &assessed,
                mean,
                config.bootstrap_confidence,
                config.bootstrap_rounds,
                &mut rng,
            );
            strategies.push(StrategyOutcome {
                kind: AggregationKind::AssessmentBootstrap,
                value: ci.low,
                ci: Some(ci),
            });
        }
    }

    if config.bootstrap_params {
        if blocks.len() < MIN_PARAM_BOOTSTRAP_BLOCKS {
            log::warn!(
                "parameter bootstrap disabled: {} blocks, need {MIN_PARAM_BOOTSTRAP_BLOCKS}",
                blocks.len()
            );
        } else if let Some(outcome) = parameter_bootstrap(&blocks, config, master_seed) {
            strategies.push(outcome);
        }
    }

    if config.large_block_assessment && block_count > 1 {
        let large = assess_one(&data, 0, config)?;
        strategies.push(StrategyOutcome {
            kind: AggregationKind::LargeBlock,
            value: large.assessed,
            ci: None,
        });
    }

    let assessed_entropy = strategies
        .iter()
        .map(|s| s.value)
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0)
        .max(0.0);

    Ok(AssessmentReport {
        symbol_count: data.len(),
        alphabet_size: whole.k,
        degenerate: false,
        blocks,
        strategies,
        median_block,
        assessed_entropy,
    })
}

fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len().max(1) as f64
}

fn sorted_median(x: &[f64]) -> f64 {
    let mut v = x.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    median(&v)
}

/// Fork-join over blocks: workers pull indices from a shared counter and
/// place results by index, so reporting order matches data order.
fn assess_blocks(
    data: &[u32],
    block_len: usize,
    block_count: usize,
    config: &AssessmentConfig,
) -> Result<Vec<BlockAssessment>> {
    let slots: Mutex<Vec<Option<Result<BlockAssessment>>>> =
        Mutex::new((0..block_count).map(|_| None).collect());
    let next: Mutex<usize> = Mutex::new(0);

    let worker = || {
        loop {
            let index = {
                let mut guard = next.lock().unwrap_or_else(|e| e.into_inner());
                if *guard >= block_count {
                    return;
                }
                let index = *guard;
                *guard += 1;
                index
            };
            let slice = &data[index * block_len..(index + 1) * block_len];
            let block = assess_one(slice, index, config);
            slots.lock().unwrap_or_else(|e| e.into_inner())[index] = Some(block);
        }
    };

    let workers = config.parallelism().min(block_count.max(1));
    if workers <= 1 {
        worker();
    } else {
        let worker = &worker;
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(worker);
            }
        });
    }

    slots
        .into_inner()
        .unwrap_or_else(|e| e.into_inner())
        .into_iter()
        .map(|slot| slot.expect("every block index was dispatched"))
        .collect()
}

/// Run the estimator battery over one block of raw symbols.
fn assess_one(slice: &[u32], index: usize, config: &AssessmentConfig) -> Result<BlockAssessment> {
    let seq = TranslatedSeq::translate(slice)?;
    let bitstring = Bitstring::expand(slice, config.little_endian);
    let bit_width = bitstring.width;

    let run_raw = config.eval != EvalMode::Bitstring;
    // A width-1 bitstring is the raw sequence again; combined mode skips
    // the duplicate track.
    let run_bits = match config.eval {
        EvalMode::Raw => false,
        EvalMode::Bitstring => bit_width >= 1,
        EvalMode::Combined => bit_width > 1,
    };

    let (results, h_original) = if run_raw {
        let results = estimators::run_all(&seq, config.test_bitmask);
        let h = estimators::assessed_entropy(&results);
        (results, h)
    } else {
        (Vec::new(), None)
    };

    let (bit_results, h_bitstring) = if run_bits {
        let bit_seq = TranslatedSeq::translate(&bitstring.bits)?;
        let results = estimators::run_all(&bit_seq, config.test_bitmask);
        let h = estimators::assessed_entropy(&results);
        (results, h)
    } else {
        (Vec::new(), None)
    };

    let per_symbol_bits = h_bitstring.map(|h| h * bit_width as f64);
    let assessed = match (h_original, per_symbol_bits) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => 0.0,
    };

    Ok(BlockAssessment {
        index,
        h_original,
        h_bitstring,
        bit_width,
        assessed,
        results,
        bit_results,
    })
}

/// Bootstrap each estimator's probability parameter across blocks and
/// re-derive entropy from the bootstrapped parameter; the strategy value is
/// the minimum across estimators.
fn parameter_bootstrap(
    blocks: &[BlockAssessment],
    config: &AssessmentConfig,
    master_seed: u64,
) -> Option<StrategyOutcome> {
    let mut best: Option<(f64, BootstrapCi)> = None;
    for kind in estimators::EstimatorKind::ALL {
        let params: Vec<f64> = blocks
            .iter()
            .filter_map(|b| {
                b.results
                    .iter()
                    .find(|r| r.kind == kind && r.completed && r.upper_bound.is_finite())
                    .map(|r| r.upper_bound)
            })
            .collect();
        if params.len() < blocks.len() {
            continue;
        }
        let mut rng = Prng::from_seed(sub_seed(master_seed, u64::MAX, 3 + kind as u64));
        let ci = bca_bootstrap(
            &params,
            mean,
            config.bootstrap_confidence,
            config.bootstrap_rounds,
            &mut rng,
        );
        // A higher parameter is a more predictable source; each kind maps
        // its own parameter scale back to bits per symbol.
        let h = kind.parameter_entropy(ci.high).max(0.0);
        if best.as_ref().is_none_or(|(b, _)| h < *b) {
            best = Some((h, ci));
        }
    }
    best.map(|(value, ci)| StrategyOutcome {
        kind: AggregationKind::ParameterBootstrap,
        value,
        ci: Some(ci),
    })
}
