//! Reporting adapters — aggregate table CSV and per-batch charts.

pub mod chart;

use crate::report::AggregateRow;
use anyhow::{Context, Result};
use std::path::Path;

/// File name of the wide aggregate table.
pub const AGGREGATE_TABLE_FILE: &str = "aggregated_stats_per_batch.csv";

/// Write the wide aggregate table as CSV. `batch_duration` is emitted in
/// whole seconds.
pub fn write_aggregate_csv(rows: &[AggregateRow], path: &Path) -> Result<()> {
    let mut out = String::from("batch_id,batch_duration,avg_temp1,avg_temp2,avg_ph1,avg_ph2\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.batch_id,
            row.batch_duration,
            row.avg_temp1,
            row.avg_temp2,
            row.avg_ph1,
            row.avg_ph2
        ));
    }
    std::fs::write(path, out)
        .with_context(|| format!("failed to write aggregate table {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AGGREGATE_TABLE_FILE);
        let rows = vec![AggregateRow {
            batch_id: "400E1".into(),
            batch_duration: 5400,
            avg_temp1: 31.0,
            avg_temp2: 31.55,
            avg_ph1: 7.1,
            avg_ph2: 7.2,
        }];

        write_aggregate_csv(&rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("batch_id,batch_duration,avg_temp1,avg_temp2,avg_ph1,avg_ph2")
        );
        assert_eq!(lines.next(), Some("400E1,5400,31,31.55,7.1,7.2"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AGGREGATE_TABLE_FILE);
        write_aggregate_csv(&[], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
