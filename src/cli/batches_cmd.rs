//! `batchwise batches` — list eligible batch ids.

use crate::cli::{open_store, output};
use crate::report;
use anyhow::Result;
use std::path::Path;

/// Run the batches command.
pub async fn run(db: &Path) -> Result<()> {
    let store = open_store(db)?;
    let batch_ids = report::eligible_batch_ids(&store)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "batch_ids": batch_ids }));
    } else if batch_ids.is_empty() {
        println!("  No eligible batches.");
    } else {
        for batch_id in &batch_ids {
            println!("  {batch_id}");
        }
    }

    Ok(())
}
