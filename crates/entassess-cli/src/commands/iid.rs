//! The IID verification command: the §5.1 permutation battery.

use std::path::Path;

use entassess_core::permutation::{STAT_NAMES, permutation_test, tail_cutoff};
use entassess_core::prng::{DETERMINISTIC_SEED, Prng};
use entassess_core::{Result, TranslatedSeq, serial_xor};

use crate::reader::{SymbolFormat, load_symbols};

pub struct IidArgs<'a> {
    pub file: &'a Path,
    pub format: SymbolFormat,
    pub window: Option<(usize, usize)>,
    pub serial_xor: usize,
    pub rounds: usize,
    pub alpha: f64,
    pub threads: usize,
    pub exhaustive: bool,
    pub deterministic: bool,
    pub verbose: u8,
    pub output: Option<&'a Path>,
}

pub fn run(args: IidArgs<'_>) -> Result<i32> {
    let symbols = load_symbols(args.file, args.format, args.window)?;
    let folded = serial_xor(&symbols, args.serial_xor);
    let seq = TranslatedSeq::translate(&folded)?;
    println!(
        "Permutation testing {} symbols (k = {}) over {} rounds",
        seq.len(),
        seq.k,
        args.rounds
    );

    let seed = if args.deterministic {
        DETERMINISTIC_SEED
    } else {
        Prng::from_os_entropy().uniform_u64()
    };
    let threads = if args.deterministic { 1 } else { args.threads };
    let outcome = permutation_test(
        &seq,
        args.rounds,
        args.alpha,
        threads,
        args.exhaustive,
        seed,
    );

    if args.verbose >= 1 {
        let cutoff = tail_cutoff(args.alpha, args.rounds);
        println!("{:<28} {:>8} {:>8} {:>8}  verdict", "statistic", "C0", "C1", "C2");
        for (name, c) in STAT_NAMES.iter().zip(&outcome.counters) {
            println!(
                "{name:<28} {:>8} {:>8} {:>8}  {}",
                c.greater,
                c.equal,
                c.less,
                if c.passed(cutoff) { "pass" } else { "FAIL" }
            );
        }
        println!("Rounds evaluated: {}", outcome.rounds_evaluated);
        if let Some(r) = outcome.completing_round {
            println!("All statistics decided by round {r}");
        }
    }

    println!(
        "IID assumption: {}",
        if outcome.passed { "PASS" } else { "FAIL" }
    );

    if let Some(path) = args.output {
        super::write_json(path, &outcome)?;
    }

    Ok(if outcome.passed { 0 } else { 1 })
}
