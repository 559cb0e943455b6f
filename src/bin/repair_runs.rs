// Template maintenance utility: merge placeholder tokens that Word split across several runs.
//
// Usage:
//   cargo run --bin repair_runs -- <input.xml> [output.xml]
//
// Without output.xml the input file is rewritten in place (atomic replace).

use pentest_report::{logging, RunSplitRepairer};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: repair_runs <input.xml> [output.xml]")?;
    let output = args.next().map(PathBuf::from);

    let report = RunSplitRepairer::new().repair_file(&input, output.as_deref())?;

    println!("tokens_before={}", report.tokens_before);
    println!("tokens_after={}", report.tokens_after);
    println!("repaired_spans={}", report.repaired_spans);
    println!("abandoned_spans={}", report.abandoned_spans);
    Ok(())
}
