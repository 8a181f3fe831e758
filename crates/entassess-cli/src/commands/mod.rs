pub mod generate;
pub mod iid;
pub mod non_iid;

use std::fs;
use std::path::Path;

use entassess_core::{ALL_ESTIMATORS, Error, EstimatorKind, Result};
use serde::Serialize;

/// Parse a comma-separated estimator list into the selection bitmask.
/// `all` (or an empty string) selects everything.
pub fn parse_estimators(spec: &str) -> Result<u32> {
    let spec = spec.trim();
    if spec.is_empty() || spec.eq_ignore_ascii_case("all") {
        return Ok(ALL_ESTIMATORS);
    }
    let mut mask = 0u32;
    for name in spec.split(',') {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "mcv" | "most-common-value" => EstimatorKind::MostCommonValue,
            "collision" => EstimatorKind::Collision,
            "markov" => EstimatorKind::Markov,
            "compression" => EstimatorKind::Compression,
            "t-tuple" | "ttuple" => EstimatorKind::TTuple,
            "lrs" => EstimatorKind::Lrs,
            "multi-mcw" | "mcw" => EstimatorKind::MultiMcw,
            "lag" => EstimatorKind::Lag,
            "multi-mmc" | "mmc" => EstimatorKind::MultiMmc,
            "lz78y" => EstimatorKind::Lz78y,
            other => {
                return Err(Error::OutOfRange(format!(
                    "unknown estimator '{other}'"
                )));
            }
        };
        mask |= kind.bit();
    }
    Ok(mask)
}

/// Write a machine-readable report next to the human-readable output.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Io(format!("serialize report: {e}")))?;
    fs::write(path, json).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    println!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_empty_select_everything() {
        assert_eq!(parse_estimators("all").unwrap(), ALL_ESTIMATORS);
        assert_eq!(parse_estimators("").unwrap(), ALL_ESTIMATORS);
    }

    #[test]
    fn names_accumulate_bits() {
        let mask = parse_estimators("mcv,lag,lz78y").unwrap();
        assert_eq!(
            mask,
            EstimatorKind::MostCommonValue.bit()
                | EstimatorKind::Lag.bit()
                | EstimatorKind::Lz78y.bit()
        );
    }

    #[test]
    fn unknown_name_rejected() {
        assert!(parse_estimators("mcv,chi-squared").is_err());
    }
}
