//! Synthetic sample generation, for exercising the assessment pipeline
//! against sources with known entropy.

use std::fs;
use std::path::Path;

use entassess_core::prng::{DETERMINISTIC_SEED, Prng};
use entassess_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceModel {
    /// Uniform symbols over `0..k`.
    Uniform,
    /// Binary with `Pr(0) = bias`.
    Biased,
    /// Binary first-order Markov with `Pr(repeat) = bias`.
    Correlated,
    /// The cycle `0, 1, …, k−1` repeated.
    Periodic,
}

impl SourceModel {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "uniform" => Ok(Self::Uniform),
            "biased" => Ok(Self::Biased),
            "correlated" => Ok(Self::Correlated),
            "periodic" => Ok(Self::Periodic),
            other => Err(Error::OutOfRange(format!("unknown source model '{other}'"))),
        }
    }
}

pub struct GenerateArgs<'a> {
    pub model: SourceModel,
    pub length: usize,
    pub alphabet: u32,
    pub bias: f64,
    pub seed: Option<u64>,
    pub output: &'a Path,
}

pub fn run(args: GenerateArgs<'_>) -> Result<i32> {
    if args.length == 0 {
        return Err(Error::OutOfRange("length must be at least 1".to_string()));
    }
    if !(2..=256).contains(&args.alphabet) {
        return Err(Error::OutOfRange(format!(
            "alphabet = {} not in 2..=256",
            args.alphabet
        )));
    }
    if !(0.0..=1.0).contains(&args.bias) {
        return Err(Error::OutOfRange(format!(
            "bias = {} not in [0, 1]",
            args.bias
        )));
    }

    let mut rng = Prng::from_seed(args.seed.unwrap_or(DETERMINISTIC_SEED));
    let symbols = synthesize(args.model, args.length, args.alphabet, args.bias, &mut rng);

    let bytes: Vec<u8> = symbols.iter().map(|&s| s as u8).collect();
    fs::write(args.output, &bytes)
        .map_err(|e| Error::Io(format!("{}: {e}", args.output.display())))?;
    println!(
        "Wrote {} symbols ({:?}, k = {}) to {}",
        symbols.len(),
        args.model,
        args.alphabet,
        args.output.display()
    );
    Ok(0)
}

fn synthesize(
    model: SourceModel,
    length: usize,
    alphabet: u32,
    bias: f64,
    rng: &mut Prng,
) -> Vec<u32> {
    match model {
        SourceModel::Uniform => (0..length).map(|_| rng.uniform_range(alphabet)).collect(),
        SourceModel::Biased => (0..length)
            .map(|_| u32::from(rng.uniform_unit() >= bias))
            .collect(),
        SourceModel::Correlated => {
            let mut out = Vec::with_capacity(length);
            let mut prev = rng.uniform_range(2);
            out.push(prev);
            for _ in 1..length {
                if rng.uniform_unit() >= bias {
                    prev = 1 - prev;
                }
                out.push(prev);
            }
            out
        }
        SourceModel::Periodic => (0..length).map(|i| i as u32 % alphabet).collect(),
    }
}
