use anyhow::{Context, Result};
use linesearch::search::{LineSearcher, tokenize};
use std::path::PathBuf;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <index_path> [term...]", args[0]);
        eprintln!("Example: {} ./shakesearch.index question nobler", args[0]);
        std::process::exit(1);
    }

    let index_path = PathBuf::from(&args[1]);
    println!("Opening index: {}", index_path.display());

    let searcher = LineSearcher::open(&index_path).context("Failed to open index")?;
    println!("Total documents: {}", searcher.num_documents());

    for raw in &args[2..] {
        // Terms are looked up in their normalized form
        for term in tokenize(raw) {
            let postings = searcher.lookup(&term)?;
            println!();
            println!("=== {term} ({} documents) ===", postings.len());

            for posting in &postings {
                let text = searcher
                    .document(&posting.document_id)?
                    .map(|doc| doc.text)
                    .unwrap_or_default();
                println!(
                    "  line {:>6}  freq {:>3}  {text}",
                    posting.line_number, posting.frequency
                );
            }
        }
    }

    Ok(())
}
