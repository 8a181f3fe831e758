//! The non-IID assessment command: run the §6.3 estimator battery over a
//! sample file and report the assessed min-entropy.

use std::path::Path;

use entassess_core::{AssessmentConfig, Result, assess};

use crate::reader::{SymbolFormat, load_symbols};

pub struct NonIidArgs<'a> {
    pub file: &'a Path,
    pub format: SymbolFormat,
    pub window: Option<(usize, usize)>,
    pub config: AssessmentConfig,
    pub output: Option<&'a Path>,
}

pub fn run(args: NonIidArgs<'_>) -> Result<i32> {
    let symbols = load_symbols(args.file, args.format, args.window)?;
    println!(
        "Assessing {} symbols from {}",
        symbols.len(),
        args.file.display()
    );

    let report = assess(&symbols, &args.config)?;

    if args.config.verbose >= 1 {
        for block in &report.blocks {
            if report.blocks.len() > 1 {
                println!("Block {}:", block.index);
            }
            for r in block.results.iter().chain(&block.bit_results) {
                if r.completed {
                    println!(
                        "  {:<34} H = {:.6}  ({:.3}s)",
                        r.kind.name(),
                        r.entropy,
                        r.runtime_secs
                    );
                } else {
                    println!("  {:<34} did not complete", r.kind.name());
                }
            }
        }
        for s in &report.strategies {
            match &s.ci {
                Some(ci) => println!(
                    "Strategy {:?}: {:.6}  [{:.6}, {:.6}] ({:?})",
                    s.kind, s.value, ci.low, ci.high, ci.method
                ),
                None => println!("Strategy {:?}: {:.6}", s.kind, s.value),
            }
        }
        if let Some(i) = report.median_block {
            println!("Closest block to the median assessment: {i}");
        }
    }

    print!("{}", report.render_text());

    if let Some(path) = args.output {
        super::write_json(path, &report)?;
    }

    if report.degenerate {
        eprintln!("Input is degenerate (single-symbol alphabet).");
        return Ok(1);
    }
    Ok(0)
}
