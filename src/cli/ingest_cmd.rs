//! `batchwise ingest` — load a tab-delimited data directory into the store.

use crate::cli::{open_store, output};
use crate::ingest;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run(db: &Path, data_dir: &Path) -> Result<()> {
    let mut store = open_store(db)?;
    let summary = ingest::ingest_dir(&mut store, data_dir)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "readings": summary.readings,
            "batches": summary.batches,
            "phases": summary.phases,
            "skipped_files": summary.skipped_files,
        }));
    } else if !output::is_quiet() {
        println!(
            "  Ingested {} reading(s), {} batch(es), {} phase(s) from {}",
            summary.readings,
            summary.batches,
            summary.phases,
            data_dir.display()
        );
        if summary.skipped_files > 0 {
            println!("  Skipped {} unrecognized file(s)", summary.skipped_files);
        }
    }

    Ok(())
}
