//! `batchwise charts` — one sensor-difference chart per eligible batch.

use crate::cli::{open_store, output};
use crate::model::CULTIVATION;
use crate::render::chart;
use crate::report;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the charts command.
pub async fn run(db: &Path, out_dir: &Path) -> Result<()> {
    let store = open_store(db)?;
    let batch_ids = report::eligible_batch_ids(&store)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut files = Vec::new();
    for batch_id in &batch_ids {
        let points = report::combined_difference(&store, batch_id, CULTIVATION)?;
        let out_file = out_dir.join(chart::chart_file_name(batch_id));
        chart::write_diff_chart(batch_id, &points, &out_file)?;
        tracing::info!("chart for batch {batch_id}: {} point(s)", points.len());
        files.push(out_file.display().to_string());
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "charts": files.len(),
            "files": files,
        }));
    } else if !output::is_quiet() {
        println!("  Wrote {} chart(s) to {}", files.len(), out_dir.display());
    }

    Ok(())
}
