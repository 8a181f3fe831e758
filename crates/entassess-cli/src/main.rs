//! CLI for entassess — assess raw noise-source output against SP 800-90B.

mod commands;
mod reader;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use entassess_core::config::{AssessmentConfig, EvalMode};

use reader::SymbolFormat;

#[derive(Parser)]
#[command(name = "entassess")]
#[command(about = "entassess — SP 800-90B min-entropy assessment")]
#[command(version = entassess_core::VERSION)]
struct Cli {
    /// Increase diagnostic verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by both assessment tracks.
#[derive(Args)]
struct InputArgs {
    /// Sample file, one symbol per byte unless --word is given.
    file: PathBuf,

    /// Bits per symbol; bytes are masked to the low bits.
    #[arg(long, default_value = "8")]
    bits_per_symbol: u32,

    /// Read 4-byte little-endian words instead of bytes.
    #[arg(long)]
    word: bool,

    /// Select the INDEX-th window of --window-size symbols.
    #[arg(long, requires = "window_size")]
    index: Option<usize>,

    /// Window length in symbols.
    #[arg(long, requires = "index")]
    window_size: Option<usize>,

    /// XOR-fold s consecutive symbols into one before assessment.
    #[arg(long, default_value = "1")]
    serial_xor: usize,

    /// Fixed seed and single-threaded execution; identical reports per run.
    #[arg(long)]
    deterministic: bool,

    /// Write the machine-readable report as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl InputArgs {
    fn format(&self) -> entassess_core::Result<SymbolFormat> {
        SymbolFormat::from_flags(self.word, self.bits_per_symbol)
    }

    fn window(&self) -> Option<(usize, usize)> {
        self.index.zip(self.window_size)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ten §6.3 non-IID estimators and report assessed min-entropy
    NonIid {
        #[command(flatten)]
        input: InputArgs,

        /// Evaluation track
        #[arg(long, default_value = "combined", value_parser = ["raw", "bitstring", "combined"])]
        eval: String,

        /// Comma-separated estimator subset, or "all"
        #[arg(long, default_value = "all")]
        estimators: String,

        /// Extract bitstring bits low-bit first
        #[arg(long)]
        little_endian: bool,

        /// Block size for partitioned assessment (0 = whole dataset)
        #[arg(long, default_value = "0")]
        block_size: usize,

        /// Report the BCa-bootstrapped median of per-block assessments
        #[arg(long)]
        median: bool,

        /// Bootstrap each estimator's proportion parameter across blocks
        #[arg(long)]
        bootstrap_params: bool,

        /// Bootstrap the per-block assessed entropies directly
        #[arg(long)]
        bootstrap_assessments: bool,

        /// Additionally assess the whole dataset as one large block
        #[arg(long)]
        large_block: bool,

        /// Bootstrap confidence level
        #[arg(long, default_value = "0.95")]
        confidence: f64,

        /// Bootstrap resampling rounds
        #[arg(long, default_value = "1000")]
        bootstrap_rounds: usize,
    },

    /// Run the §5.1 permutation battery and report the IID verdict
    Iid {
        #[command(flatten)]
        input: InputArgs,

        /// Shuffling rounds
        #[arg(long, default_value = "10000")]
        rounds: usize,

        /// Significance level
        #[arg(long, default_value = "0.001")]
        alpha: f64,

        /// Worker threads (0 = one per core)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Evaluate every statistic in every round; no early termination
        #[arg(long)]
        exhaustive: bool,
    },

    /// Generate synthetic samples with known entropy
    Generate {
        /// Source model
        #[arg(long, default_value = "uniform", value_parser = ["uniform", "biased", "correlated", "periodic"])]
        model: String,

        /// Number of symbols
        #[arg(long, default_value = "1000000")]
        length: usize,

        /// Alphabet size for uniform/periodic models
        #[arg(long, default_value = "256")]
        alphabet: u32,

        /// Pr(0) for biased, Pr(repeat) for correlated
        #[arg(long, default_value = "0.5")]
        bias: f64,

        /// PRNG seed (fixed default)
        #[arg(long)]
        seed: Option<u64>,

        /// Output file
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let outcome = match cli.command {
        Commands::NonIid {
            input,
            eval,
            estimators,
            little_endian,
            block_size,
            median,
            bootstrap_params,
            bootstrap_assessments,
            large_block,
            confidence,
            bootstrap_rounds,
        } => input.format().and_then(|format| {
            let config = AssessmentConfig {
                verbose: cli.verbose.min(10),
                eval: match eval.as_str() {
                    "raw" => EvalMode::Raw,
                    "bitstring" => EvalMode::Bitstring,
                    _ => EvalMode::Combined,
                },
                test_bitmask: commands::parse_estimators(&estimators)?,
                little_endian,
                block_size,
                bootstrap_confidence: confidence,
                bootstrap_rounds,
                bootstrap_params,
                bootstrap_assessments,
                large_block_assessment: large_block,
                median_report: median,
                serial_xor: input.serial_xor,
                deterministic: input.deterministic,
                ..Default::default()
            };
            commands::non_iid::run(commands::non_iid::NonIidArgs {
                file: &input.file,
                format,
                window: input.window(),
                config,
                output: input.output.as_deref(),
            })
        }),
        Commands::Iid {
            input,
            rounds,
            alpha,
            threads,
            exhaustive,
        } => input.format().and_then(|format| {
            let threads = if threads == 0 {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            } else {
                threads
            };
            commands::iid::run(commands::iid::IidArgs {
                file: &input.file,
                format,
                window: input.window(),
                serial_xor: input.serial_xor,
                rounds,
                alpha,
                threads,
                exhaustive,
                deterministic: input.deterministic,
                verbose: cli.verbose,
                output: input.output.as_deref(),
            })
        }),
        Commands::Generate {
            model,
            length,
            alphabet,
            bias,
            seed,
            output,
        } => commands::generate::SourceModel::parse(&model).and_then(|model| {
            commands::generate::run(commands::generate::GenerateArgs {
                model,
                length,
                alphabet,
                bias,
                seed,
                output: &output,
            })
        }),
    };

    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
