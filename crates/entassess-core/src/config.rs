//! Assessment configuration.
//!
//! One immutable value object threaded through every entry point. There is no
//! global verbosity flag: the CLI maps `verbose` onto a log filter and the
//! engine reads the rest of the fields directly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which dataset(s) the estimators run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// Estimate the translated symbol sequence only.
    Raw,
    /// Estimate the expanded bitstring only.
    Bitstring,
    /// Estimate both and combine per symbol.
    #[default]
    Combined,
}

impl std::fmt::Display for EvalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Bitstring => write!(f, "bitstring"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

/// Bitmask selecting a subset of the ten estimators. All bits set runs
/// everything; see [`crate::estimators::EstimatorKind::bit`].
pub const ALL_ESTIMATORS: u32 = 0x3ff;

/// Configuration for a full assessment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Verbosity 0–10. The engine only consults this for diagnostic volume;
    /// output routing is the caller's concern.
    pub verbose: u8,
    /// Raw, bitstring, or combined evaluation.
    pub eval: EvalMode,
    /// Subset of estimators to run (bit per estimator).
    pub test_bitmask: u32,
    /// Bit order for bitstring extraction. Big-endian by default.
    pub little_endian: bool,
    /// Block size for partitioned assessment; 0 disables partitioning.
    pub block_size: usize,
    /// Synthetic-data length for the CLI generator; unused by the engine.
    pub random_rounds: usize,
    /// Bootstrap confidence level in [0, 1].
    pub bootstrap_confidence: f64,
    /// Bootstrap resampling rounds.
    pub bootstrap_rounds: usize,
    /// Bootstrap each estimator's proportion parameter across blocks.
    pub bootstrap_params: bool,
    /// Bootstrap the per-block assessed entropies directly.
    pub bootstrap_assessments: bool,
    /// Additionally run the estimators once over the whole dataset.
    pub large_block_assessment: bool,
    /// Report the BCa-bootstrapped median of per-block minima.
    pub median_report: bool,
    /// XOR-fold s consecutive symbols into one before assessment (s:1).
    pub serial_xor: usize,
    /// Single-threaded, fixed-seed execution.
    pub deterministic: bool,
    /// Significance level for the permutation battery.
    pub alpha: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            eval: EvalMode::Combined,
            test_bitmask: ALL_ESTIMATORS,
            little_endian: false,
            block_size: 0,
            random_rounds: 0,
            bootstrap_confidence: 0.95,
            bootstrap_rounds: 1_000,
            bootstrap_params: false,
            bootstrap_assessments: false,
            large_block_assessment: false,
            median_report: false,
            serial_xor: 1,
            deterministic: false,
            alpha: 0.001,
        }
    }
}

impl AssessmentConfig {
    /// Validate every field against its accepted interval.
    pub fn validate(&self) -> Result<()> {
        if self.verbose > 10 {
            return Err(Error::OutOfRange(format!(
                "verbose = {} not in 0..=10",
                self.verbose
            )));
        }
        if !(0.0..=1.0).contains(&self.bootstrap_confidence) {
            return Err(Error::OutOfRange(format!(
                "bootstrap_confidence = {} not in [0, 1]",
                self.bootstrap_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::OutOfRange(format!(
                "alpha = {} not in [0, 1]",
                self.alpha
            )));
        }
        if self.bootstrap_rounds == 0 {
            return Err(Error::OutOfRange(
                "bootstrap_rounds must be at least 1".to_string(),
            ));
        }
        if self.serial_xor == 0 {
            return Err(Error::OutOfRange(
                "serial_xor must be at least 1".to_string(),
            ));
        }
        if self.test_bitmask & ALL_ESTIMATORS == 0 {
            return Err(Error::OutOfRange(
                "test_bitmask selects no estimator".to_string(),
            ));
        }
        Ok(())
    }

    /// Worker count for block dispatch: `round(1.3 × cores)`, or 1 in
    /// deterministic mode.
    pub fn parallelism(&self) -> usize {
        if self.deterministic {
            return 1;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        ((cores as f64) * 1.3).round().max(1.0) as usize
    }
}
