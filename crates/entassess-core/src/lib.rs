//! # entassess-core
//!
//! **Min-entropy assessment per NIST SP 800-90B.**
//!
//! `entassess-core` is the estimation engine behind the `entassess` tool: the
//! ten non-IID min-entropy estimators of SP 800-90B §6.3, the IID permutation
//! battery of §5.1, and BCa-bootstrap aggregation over partitioned datasets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use entassess_core::{AssessmentConfig, assess};
//!
//! let symbols: Vec<u32> = std::fs::read("noise.bin")
//!     .expect("read noise samples")
//!     .into_iter()
//!     .map(u32::from)
//!     .collect();
//!
//! let config = AssessmentConfig::default();
//! let report = assess(&symbols, &config).expect("assessment");
//! println!("{}", report.render_text());
//! ```
//!
//! ## Architecture
//!
//! Raw symbols → serial-XOR fold → translation → blocks → estimators →
//! aggregation.
//!
//! Each block runs the estimator battery independently (in parallel across a
//! small worker pool); the per-block minima are then combined by the enabled
//! aggregation strategies, and the final figure is the strategy minimum. The
//! IID track is separate: [`permutation::permutation_test`] shuffles the data
//! and compares nineteen statistics against their reference values.
//!
//! Everything is deterministic when asked: [`AssessmentConfig::deterministic`]
//! pins the seed and the worker count, and repeated runs produce identical
//! reports.

pub mod assessment;
pub mod bootstrap;
pub mod config;
pub mod dict_tree;
pub mod error;
pub mod estimators;
pub mod numerics;
pub mod permutation;
pub mod prng;
pub mod rbtree;
pub mod sequence;
pub mod suffix;

pub use assessment::{
    AggregationKind, AssessmentReport, BlockAssessment, StrategyOutcome, assess,
};
pub use config::{ALL_ESTIMATORS, AssessmentConfig, EvalMode};
pub use error::{Error, Result};
pub use estimators::{EstimatorKind, EstimatorResult};
pub use permutation::{PermutationOutcome, permutation_test};
pub use sequence::{Bitstring, TranslatedSeq, serial_xor};

/// Crate version, re-exported for report headers.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
