//! `batchwise diff` — print one batch's paired-sensor difference series.

use crate::cli::{open_store, output};
use crate::model::{SensorFamily, CULTIVATION};
use crate::report;
use anyhow::Result;
use std::path::Path;

/// Run the diff command.
pub async fn run(db: &Path, batch_id: &str, family: &str) -> Result<()> {
    // Unknown family names fail here, before any query runs.
    let family: SensorFamily = family.parse()?;

    let store = open_store(db)?;
    let points = report::sensor_difference(&store, batch_id, family, CULTIVATION)?;

    if output::is_json() {
        let json_points: Vec<serde_json::Value> = points
            .iter()
            .map(|p| serde_json::json!([p.date.to_rfc3339(), p.difference]))
            .collect();
        output::print_json(&serde_json::json!({
            "batch_id": batch_id,
            "family": family.to_string(),
            "points": json_points,
        }));
    } else if points.is_empty() {
        println!("  No difference data for batch {batch_id}.");
    } else {
        let (sensor1, sensor2) = family.sensors();
        println!("  {sensor2} - {sensor1} for batch {batch_id}:\n");
        for point in &points {
            println!(
                "    {}  {:+.3}",
                point.date.format("%Y-%m-%d %H:%M"),
                point.difference
            );
        }
    }

    Ok(())
}
