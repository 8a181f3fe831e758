//! Error types for the assessment engine.
//!
//! Interior functions return [`Result`]; the CLI driver translates kinds into
//! process exit codes. Estimator-level failure (a root finder that does not
//! converge, a predictor with zero correct predictions) is *not* an error:
//! those paths report their fallback entropy and participate in the minimum
//! normally.

use std::fmt;

/// Errors produced by the assessment engine.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Empty input, or a degenerate dataset (alphabet collapses to one
    /// symbol after translation).
    InvalidInput(String),
    /// A configuration value outside its accepted interval.
    OutOfRange(String),
    /// The selected estimators cannot produce a single result: every
    /// enabled kind is inapplicable to the data (a binary-only subset on a
    /// wider alphabet with the bitstring track off). A strategy short of
    /// blocks is merely disabled with a diagnostic; this kind surfaces only
    /// when nothing at all can run.
    InsufficientData(String),
    /// File loading failed (CLI layer).
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::OutOfRange(msg) => write!(f, "out of range: {msg}"),
            Error::InsufficientData(msg) => write!(f, "insufficient data: {msg}"),
            Error::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, Error>;
