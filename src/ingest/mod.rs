//! Bulk ingestion — tab-delimited exports loaded into the batch store.
//!
//! Sensor identity is encoded in the filename: the final `_`-separated token
//! of the file stem names the stream (`400E_2021_temp1.csv` → `temp1`) and
//! is validated against the fixed stream mapping before any row is parsed.
//! Batch metadata lives in two fixed-name files alongside the sensor files.

use crate::model::{NewBatch, NewPhase, SensorReading, SensorStream};
use crate::store::BatchStore;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed metadata file names inside a data directory.
const BATCH_INFO_FILE: &str = "batch_info.csv";
const BATCH_PHASE_FILE: &str = "batch_phase.csv";

/// Row counts loaded by [`ingest_dir`].
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct IngestSummary {
    pub readings: usize,
    pub batches: usize,
    pub phases: usize,
    pub skipped_files: usize,
}

/// Parse a timestamp: RFC 3339, or a naive `YYYY-MM-DD HH:MM[:SS]` taken as
/// UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc());
        }
    }
    bail!("invalid timestamp '{raw}'. Use ISO 8601 (e.g. 2021-03-01 06:30:00 or 2021-03-01T06:30:00Z)")
}

/// The sensor stream a file carries, from the stem's final `_` token.
/// `None` for files that do not name a stream.
pub fn stream_for_file(path: &Path) -> Option<SensorStream> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit('_').next().and_then(|token| token.parse().ok())
}

/// Data lines of a tab-delimited file: the header line is skipped, blank
/// lines ignored. Yields `(line_number, line)` with 1-based numbering.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
}

fn split_columns(line: &str, want: usize, lineno: usize) -> Result<Vec<&str>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != want {
        bail!(
            "line {lineno}: expected {want} tab-separated columns, found {}",
            columns.len()
        );
    }
    Ok(columns)
}

/// Read one sensor file (columns `timestamp`, `value`).
pub fn read_sensor_file(path: &Path) -> Result<Vec<SensorReading>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read sensor file {}", path.display()))?;

    let mut readings = Vec::new();
    for (lineno, line) in data_lines(&text) {
        let columns = split_columns(line, 2, lineno)?;
        let timestamp =
            parse_instant(columns[0].trim()).with_context(|| format!("line {lineno}"))?;
        let value: f64 = columns[1]
            .trim()
            .parse()
            .with_context(|| format!("line {lineno}: invalid value '{}'", columns[1].trim()))?;
        readings.push(SensorReading { timestamp, value });
    }
    Ok(readings)
}

/// Read `batch_info.csv` (columns `StartDate`, `EndDate`, `BatchID`).
///
/// An empty BatchID becomes `None`; the literal string `NaN` is stored
/// verbatim — eligibility filtering, not ingestion, interprets the sentinel.
pub fn read_batch_info_file(path: &Path) -> Result<Vec<NewBatch>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch info file {}", path.display()))?;

    let mut batches = Vec::new();
    for (lineno, line) in data_lines(&text) {
        let columns = split_columns(line, 3, lineno)?;
        let start = parse_instant(columns[0].trim()).with_context(|| format!("line {lineno}"))?;
        let end = parse_instant(columns[1].trim()).with_context(|| format!("line {lineno}"))?;
        let batch_id = match columns[2].trim() {
            "" => None,
            id => Some(id.to_string()),
        };
        batches.push(NewBatch { start, end, batch_id });
    }
    Ok(batches)
}

/// Read `batch_phase.csv` (columns `StartDate`, `EndDate`, `BatchPhase`).
pub fn read_batch_phase_file(path: &Path) -> Result<Vec<NewPhase>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch phase file {}", path.display()))?;

    let mut phases = Vec::new();
    for (lineno, line) in data_lines(&text) {
        let columns = split_columns(line, 3, lineno)?;
        let start = parse_instant(columns[0].trim()).with_context(|| format!("line {lineno}"))?;
        let end = parse_instant(columns[1].trim()).with_context(|| format!("line {lineno}"))?;
        phases.push(NewPhase {
            start,
            end,
            phase: columns[2].trim().to_string(),
        });
    }
    Ok(phases)
}

/// Load a full data directory: both metadata files plus every sensor file.
///
/// Files whose stem does not name a known stream are skipped with a warning
/// (the upstream exporter writes nothing else into the directory). A
/// malformed row aborts its file with a line-numbered error; there is no
/// partial-row recovery.
pub fn ingest_dir(store: &mut BatchStore, dir: &Path) -> Result<IngestSummary> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read data directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut summary = IngestSummary::default();
    for path in entries {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name == BATCH_INFO_FILE {
            let batches = read_batch_info_file(&path)?;
            store
                .insert_batches(&batches)
                .context("failed to store batch info")?;
            tracing::info!("loaded {} batch(es) from {}", batches.len(), path.display());
            summary.batches += batches.len();
        } else if name == BATCH_PHASE_FILE {
            let phases = read_batch_phase_file(&path)?;
            store
                .insert_phases(&phases)
                .context("failed to store batch phases")?;
            tracing::info!("loaded {} phase(s) from {}", phases.len(), path.display());
            summary.phases += phases.len();
        } else if let Some(stream) = stream_for_file(&path) {
            let readings = read_sensor_file(&path)?;
            store
                .insert_readings(stream, &readings)
                .with_context(|| format!("failed to store readings from {}", path.display()))?;
            tracing::info!(
                "loaded {} reading(s) into {stream} from {}",
                readings.len(),
                path.display()
            );
            summary.readings += readings.len();
        } else {
            tracing::warn!(
                "skipping {}: filename does not identify a sensor stream",
                path.display()
            );
            summary.skipped_files += 1;
        }
    }
    Ok(summary)
}
