// Template maintenance utility: extract fragment templates from an annotated document.xml.
//
// Usage:
//   cargo run --bin extract_fragments -- <document.xml> <output_dir> [--clean]
//
// With --clean, extracted paragraphs are removed from the source document.

use pentest_report::{logging, FragmentExtractor};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut positional = Vec::new();
    let mut clean_source = false;
    for arg in std::env::args().skip(1) {
        if arg == "--clean" {
            clean_source = true;
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    let [source, output_dir] = positional.as_slice() else {
        return Err("usage: extract_fragments <document.xml> <output_dir> [--clean]".into());
    };

    let report = FragmentExtractor::new().extract_file(source, output_dir, clean_source)?;

    println!("paragraphs_scanned={}", report.paragraphs_scanned);
    println!("candidates={}", report.candidates);
    println!("toc_skipped={}", report.toc_skipped);
    println!("ambiguous_skipped={}", report.ambiguous_skipped);
    for class in &report.duplicates {
        println!("duplicate={}", class);
    }
    for fragment in &report.written {
        println!("written={} -> {}", fragment.class, fragment.path.display());
    }
    for class in report.missing_classes() {
        println!("missing={}", class);
    }
    println!("count={}", report.count());
    Ok(())
}
