//! SQLite-backed batch store — the persistence collaborator.
//!
//! Ingestion writes, reporting reads; nothing is ever updated in place.
//! Timestamps are stored as Unix epoch seconds so SQL `BETWEEN` range
//! predicates compare exactly, and every read is pushed down as a
//! range/predicate query rather than a full-table scan.

use crate::model::{BatchInfo, BatchPhase, NewBatch, NewPhase, SensorReading, SensorStream};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// Storage failures. Both variants terminate the current report and are
/// surfaced to the caller immediately; no operation retries.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to open batch store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("storage query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS temp1 (timestamp INTEGER PRIMARY KEY, value REAL NOT NULL);
CREATE TABLE IF NOT EXISTS temp2 (timestamp INTEGER PRIMARY KEY, value REAL NOT NULL);
CREATE TABLE IF NOT EXISTS ph1 (timestamp INTEGER PRIMARY KEY, value REAL NOT NULL);
CREATE TABLE IF NOT EXISTS ph2 (timestamp INTEGER PRIMARY KEY, value REAL NOT NULL);
CREATE TABLE IF NOT EXISTS batch_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_date INTEGER NOT NULL,
    end_date INTEGER NOT NULL,
    batch_id TEXT
);
CREATE TABLE IF NOT EXISTS batch_phase (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_date INTEGER NOT NULL,
    end_date INTEGER NOT NULL,
    phase TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_batch_phase_kind_start ON batch_phase (phase, start_date);
";

fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Handle on one store. Opened per unit of work and passed explicitly into
/// every reporting operation; dropped when the work is done.
pub struct BatchStore {
    db: Connection,
}

impl BatchStore {
    /// Open or create a store at `path`. Schema creation is idempotent.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::init(db)
    }

    /// In-memory store, used by tests and throwaway pipelines.
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::init(db)
    }

    fn init(db: Connection) -> StoreResult<Self> {
        db.execute_batch(SCHEMA)?;
        Ok(Self { db })
    }

    /// Bulk-insert sensor readings in one transaction.
    ///
    /// The timestamp is the stream's primary key; re-ingesting a file
    /// replaces rather than duplicates.
    pub fn insert_readings(
        &mut self,
        stream: SensorStream,
        readings: &[SensorReading],
    ) -> StoreResult<usize> {
        let tx = self.db.transaction()?;
        {
            let sql = format!(
                "INSERT OR REPLACE INTO {} (timestamp, value) VALUES (?1, ?2)",
                stream.table()
            );
            let mut stmt = tx.prepare(&sql)?;
            for reading in readings {
                stmt.execute(params![reading.timestamp.timestamp(), reading.value])?;
            }
        }
        tx.commit()?;
        Ok(readings.len())
    }

    /// Bulk-insert batch lifetimes in one transaction.
    pub fn insert_batches(&mut self, batches: &[NewBatch]) -> StoreResult<usize> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO batch_info (start_date, end_date, batch_id) VALUES (?1, ?2, ?3)",
            )?;
            for batch in batches {
                stmt.execute(params![
                    batch.start.timestamp(),
                    batch.end.timestamp(),
                    batch.batch_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(batches.len())
    }

    /// Bulk-insert phase intervals in one transaction.
    pub fn insert_phases(&mut self, phases: &[NewPhase]) -> StoreResult<usize> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO batch_phase (start_date, end_date, phase) VALUES (?1, ?2, ?3)",
            )?;
            for phase in phases {
                stmt.execute(params![
                    phase.start.timestamp(),
                    phase.end.timestamp(),
                    phase.phase,
                ])?;
            }
        }
        tx.commit()?;
        Ok(phases.len())
    }

    /// All batch rows, in storage (insertion) order.
    pub fn batches(&self) -> StoreResult<Vec<BatchInfo>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, start_date, end_date, batch_id FROM batch_info ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BatchInfo {
                    id: row.get(0)?,
                    start: from_epoch(row.get(1)?),
                    end: from_epoch(row.get(2)?),
                    batch_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All batch rows carrying the given batch id, in storage order.
    pub fn batches_named(&self, batch_id: &str) -> StoreResult<Vec<BatchInfo>> {
        let mut stmt = self.db.prepare(
            "SELECT id, start_date, end_date, batch_id FROM batch_info
              WHERE batch_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![batch_id], |row| {
                Ok(BatchInfo {
                    id: row.get(0)?,
                    start: from_epoch(row.get(1)?),
                    end: from_epoch(row.get(2)?),
                    batch_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Phase rows of `kind` whose start instant lies in `[from, to]`, both
    /// ends inclusive, ordered by start.
    pub fn phases_starting_between(
        &self,
        kind: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<BatchPhase>> {
        let mut stmt = self.db.prepare(
            "SELECT id, start_date, end_date, phase FROM batch_phase
              WHERE phase = ?1 AND start_date BETWEEN ?2 AND ?3
              ORDER BY start_date, id",
        )?;
        let rows = stmt
            .query_map(params![kind, from.timestamp(), to.timestamp()], |row| {
                Ok(BatchPhase {
                    id: row.get(0)?,
                    start: from_epoch(row.get(1)?),
                    end: from_epoch(row.get(2)?),
                    phase: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Readings of `stream` with timestamp in `[from, to]`, both ends
    /// inclusive, ordered by timestamp.
    pub fn readings_between(
        &self,
        stream: SensorStream,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<SensorReading>> {
        let sql = format!(
            "SELECT timestamp, value FROM {} WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp",
            stream.table()
        );
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(params![from.timestamp(), to.timestamp()], |row| {
                Ok(SensorReading {
                    timestamp: from_epoch(row.get(0)?),
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn table_count(&self, table: &str) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count = self.db.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of readings stored for `stream`.
    pub fn reading_count(&self, stream: SensorStream) -> StoreResult<i64> {
        self.table_count(stream.table())
    }

    /// Number of batch rows stored, eligible or not.
    pub fn batch_count(&self) -> StoreResult<i64> {
        self.table_count("batch_info")
    }

    /// Number of phase rows stored, all kinds.
    pub fn phase_count(&self) -> StoreResult<i64> {
        self.table_count("batch_phase")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_reading_roundtrip_and_range() {
        let mut store = BatchStore::open_in_memory().unwrap();
        store
            .insert_readings(
                SensorStream::Temp1,
                &[
                    SensorReading { timestamp: ts(6, 0, 0), value: 29.5 },
                    SensorReading { timestamp: ts(6, 1, 0), value: 30.0 },
                    SensorReading { timestamp: ts(6, 2, 0), value: 30.5 },
                ],
            )
            .unwrap();

        // BETWEEN is inclusive on both ends.
        let rows = store
            .readings_between(SensorStream::Temp1, ts(6, 0, 0), ts(6, 1, 0))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, 29.5);
        assert_eq!(rows[1].value, 30.0);

        // Streams are independent tables.
        assert!(store
            .readings_between(SensorStream::Temp2, ts(6, 0, 0), ts(6, 2, 0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_reinserting_a_timestamp_replaces() {
        let mut store = BatchStore::open_in_memory().unwrap();
        let reading = SensorReading { timestamp: ts(6, 0, 0), value: 1.0 };
        store.insert_readings(SensorStream::Ph1, &[reading]).unwrap();
        store
            .insert_readings(
                SensorStream::Ph1,
                &[SensorReading { timestamp: ts(6, 0, 0), value: 2.0 }],
            )
            .unwrap();

        let rows = store
            .readings_between(SensorStream::Ph1, ts(6, 0, 0), ts(6, 0, 0))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 2.0);
    }

    #[test]
    fn test_batches_keep_storage_order() {
        let mut store = BatchStore::open_in_memory().unwrap();
        store
            .insert_batches(&[
                NewBatch { start: ts(8, 0, 0), end: ts(9, 0, 0), batch_id: Some("B2".into()) },
                NewBatch { start: ts(6, 0, 0), end: ts(7, 0, 0), batch_id: Some("B1".into()) },
                NewBatch { start: ts(7, 0, 0), end: ts(8, 0, 0), batch_id: None },
            ])
            .unwrap();

        let batches = store.batches().unwrap();
        assert_eq!(batches.len(), 3);
        // Insertion order, not chronological order.
        assert_eq!(batches[0].batch_id.as_deref(), Some("B2"));
        assert_eq!(batches[1].batch_id.as_deref(), Some("B1"));
        assert_eq!(batches[2].batch_id, None);

        let named = store.batches_named("B1").unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].start, ts(6, 0, 0));
    }

    #[test]
    fn test_phase_predicate_pushdown() {
        let mut store = BatchStore::open_in_memory().unwrap();
        store
            .insert_phases(&[
                NewPhase { start: ts(6, 10, 0), end: ts(7, 40, 0), phase: "cultivation".into() },
                NewPhase { start: ts(7, 50, 0), end: ts(8, 0, 0), phase: "harvest".into() },
                NewPhase { start: ts(9, 0, 0), end: ts(10, 0, 0), phase: "cultivation".into() },
            ])
            .unwrap();

        let phases = store
            .phases_starting_between("cultivation", ts(6, 0, 0), ts(8, 0, 0))
            .unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].start, ts(6, 10, 0));

        // Inclusive on the start boundary.
        let phases = store
            .phases_starting_between("cultivation", ts(6, 10, 0), ts(6, 10, 0))
            .unwrap();
        assert_eq!(phases.len(), 1);
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batchwise.db");

        {
            let mut store = BatchStore::open(&path).unwrap();
            store
                .insert_readings(
                    SensorStream::Temp2,
                    &[SensorReading { timestamp: ts(6, 0, 0), value: 30.1 }],
                )
                .unwrap();
        }

        let store = BatchStore::open(&path).unwrap();
        assert_eq!(store.reading_count(SensorStream::Temp2).unwrap(), 1);
        assert_eq!(store.reading_count(SensorStream::Temp1).unwrap(), 0);
    }
}
