//! `batchwise status` — store location and row counts.

use crate::cli::{open_store, output};
use crate::model::SensorStream;
use crate::report;
use anyhow::Result;
use std::path::Path;

/// Run the status command.
pub async fn run(db: &Path) -> Result<()> {
    let store = open_store(db)?;

    let mut readings = serde_json::Map::new();
    for stream in SensorStream::ALL {
        readings.insert(
            stream.to_string(),
            serde_json::json!(store.reading_count(stream)?),
        );
    }
    let batches = store.batch_count()?;
    let phases = store.phase_count()?;
    let eligible = report::eligible_batch_ids(&store)?.len();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "db": db.display().to_string(),
            "readings": readings,
            "batches": batches,
            "eligible_batches": eligible,
            "phases": phases,
        }));
    } else if !output::is_quiet() {
        println!("  Store: {}", db.display());
        for stream in SensorStream::ALL {
            println!("    {stream}: {} reading(s)", store.reading_count(stream)?);
        }
        println!("  Batches: {batches} ({eligible} eligible)");
        println!("  Phases: {phases}");
    }

    Ok(())
}
