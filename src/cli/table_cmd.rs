//! `batchwise table` — the wide per-batch aggregate table as CSV.

use crate::cli::{open_store, output};
use crate::model::CULTIVATION;
use crate::render;
use crate::report;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the table command.
pub async fn run(db: &Path, out_dir: &Path) -> Result<()> {
    let store = open_store(db)?;
    let rows = report::aggregate_all(&store, CULTIVATION)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let out_file = out_dir.join(render::AGGREGATE_TABLE_FILE);
    render::write_aggregate_csv(&rows, &out_file)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "rows": rows.len(),
            "file": out_file.display().to_string(),
        }));
    } else if !output::is_quiet() {
        println!("  Wrote {} row(s) to {}", rows.len(), out_file.display());
    }

    Ok(())
}
