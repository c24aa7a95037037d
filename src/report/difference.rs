//! Paired-sensor difference — cross-sensor timestamp reconciliation.
//!
//! The two streams of a family sample independently, so their timestamps
//! rarely match exactly. Readings are aligned by shifting each raw timestamp
//! forward 30 seconds and truncating to the containing minute: anything
//! within ±30 s of a minute boundary lands in that minute's bucket, and the
//! bucket is the join key.
//!
//! The rule assumes sensors sample at roughly one-minute cadence with clock
//! skew bounded by ±30 s. Faster or irregular sampling is not rejected, but
//! within one bucket the later reading of a stream silently wins and pairing
//! quality degrades accordingly.

use crate::model::SensorFamily;
use crate::report::resolver::resolve_phases;
use crate::store::{BatchStore, StoreResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Seconds a raw timestamp is shifted forward before minute truncation.
const BUCKET_SHIFT_SECS: i64 = 30;

/// Map a raw timestamp onto its reconciliation bucket.
pub fn bucket_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    let shifted = ts.timestamp() + BUCKET_SHIFT_SECS;
    let bucket = shifted.div_euclid(60) * 60;
    DateTime::from_timestamp(bucket, 0).unwrap_or_else(Utc::now)
}

/// One point of a difference series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiffPoint {
    /// Reconciliation bucket the pair landed in.
    pub date: DateTime<Utc>,
    /// `sensor2 − sensor1` at this bucket.
    pub difference: f64,
}

/// One point of the combined temperature + pH comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CombinedDiffPoint {
    pub date: DateTime<Utc>,
    pub temp_difference: f64,
    pub ph_difference: f64,
}

/// Difference series `sensor2 − sensor1` for one batch and one family,
/// restricted to the batch's `kind` phase windows.
///
/// Only readings whose *raw* timestamp lies inside a resolved window
/// participate; a batch with several matching phases pools readings from all
/// of them. Buckets present in both streams survive the join, unmatched
/// buckets are silently dropped, and the output is ascending by bucket with
/// no duplicate keys. An unknown batch id, a batch with no phases, or a
/// window with no readings all yield an empty series — never an error.
pub fn sensor_difference(
    store: &BatchStore,
    batch_id: &str,
    family: SensorFamily,
    kind: &str,
) -> StoreResult<Vec<DiffPoint>> {
    let (sensor1, sensor2) = family.sensors();
    let mut first: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    let mut second: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

    for batch in store.batches_named(batch_id)? {
        for window in resolve_phases(store, &batch, kind)? {
            for reading in store.readings_between(sensor1, window.start, window.end)? {
                first.insert(bucket_minute(reading.timestamp), reading.value);
            }
            for reading in store.readings_between(sensor2, window.start, window.end)? {
                second.insert(bucket_minute(reading.timestamp), reading.value);
            }
        }
    }

    Ok(second
        .into_iter()
        .filter_map(|(bucket, value2)| {
            first.get(&bucket).map(|value1| DiffPoint {
                date: bucket,
                difference: value2 - value1,
            })
        })
        .collect())
}

/// Combined temperature + pH comparison for one batch: the two family series
/// inner-joined on the bucket. Minutes present in only one family are
/// dropped. Feeds the per-batch comparison chart.
pub fn combined_difference(
    store: &BatchStore,
    batch_id: &str,
    kind: &str,
) -> StoreResult<Vec<CombinedDiffPoint>> {
    let temp = sensor_difference(store, batch_id, SensorFamily::Temp, kind)?;
    let ph: BTreeMap<DateTime<Utc>, f64> = sensor_difference(store, batch_id, SensorFamily::Ph, kind)?
        .into_iter()
        .map(|point| (point.date, point.difference))
        .collect();

    Ok(temp
        .into_iter()
        .filter_map(|point| {
            ph.get(&point.date).map(|&ph_difference| CombinedDiffPoint {
                date: point.date,
                temp_difference: point.difference,
                ph_difference,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewBatch, NewPhase, SensorReading, SensorStream, CULTIVATION};
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, h, m, s).unwrap()
    }

    fn store_with_batch() -> BatchStore {
        let mut store = BatchStore::open_in_memory().unwrap();
        store
            .insert_batches(&[NewBatch {
                start: at(11, 0, 0),
                end: at(14, 0, 0),
                batch_id: Some("B1".into()),
            }])
            .unwrap();
        store
            .insert_phases(&[NewPhase {
                start: at(11, 30, 0),
                end: at(13, 30, 0),
                phase: CULTIVATION.into(),
            }])
            .unwrap();
        store
    }

    fn insert(store: &mut BatchStore, stream: SensorStream, points: &[(DateTime<Utc>, f64)]) {
        let readings: Vec<SensorReading> = points
            .iter()
            .map(|&(timestamp, value)| SensorReading { timestamp, value })
            .collect();
        store.insert_readings(stream, &readings).unwrap();
    }

    #[test]
    fn test_bucket_minute_shift_and_truncate() {
        assert_eq!(bucket_minute(at(12, 0, 31)), at(12, 1, 0));
        assert_eq!(bucket_minute(at(12, 0, 58)), at(12, 1, 0));
        assert_eq!(bucket_minute(at(12, 0, 29)), at(12, 0, 0));
        assert_eq!(bucket_minute(at(12, 0, 30)), at(12, 1, 0));
        assert_eq!(bucket_minute(at(12, 0, 0)), at(12, 0, 0));
    }

    #[test]
    fn test_jitter_within_tolerance_pairs() {
        let mut store = store_with_batch();
        insert(&mut store, SensorStream::Temp1, &[(at(12, 0, 31), 30.0)]);
        insert(&mut store, SensorStream::Temp2, &[(at(12, 0, 58), 30.5)]);

        let diff = sensor_difference(&store, "B1", SensorFamily::Temp, CULTIVATION).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].date, at(12, 1, 0));
        assert!((diff[0].difference - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_across_boundary_does_not_pair() {
        let mut store = store_with_batch();
        // 12:00:29 buckets to 12:00, 12:00:58 buckets to 12:01.
        insert(&mut store, SensorStream::Temp1, &[(at(12, 0, 29), 30.0)]);
        insert(&mut store, SensorStream::Temp2, &[(at(12, 0, 58), 30.5)]);

        let diff = sensor_difference(&store, "B1", SensorFamily::Temp, CULTIVATION).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_series_is_sorted_with_unique_buckets() {
        let mut store = store_with_batch();
        insert(
            &mut store,
            SensorStream::Temp1,
            &[
                (at(12, 10, 0), 30.0),
                (at(12, 5, 0), 29.0),
                (at(12, 20, 0), 31.0),
            ],
        );
        insert(
            &mut store,
            SensorStream::Temp2,
            &[
                (at(12, 20, 10), 31.4),
                (at(12, 5, 5), 29.2),
                (at(12, 10, 10), 30.1),
            ],
        );

        let diff = sensor_difference(&store, "B1", SensorFamily::Temp, CULTIVATION).unwrap();
        let dates: Vec<DateTime<Utc>> = diff.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![at(12, 5, 0), at(12, 10, 0), at(12, 20, 0)]);
    }

    #[test]
    fn test_raw_timestamp_outside_window_is_excluded() {
        let mut store = store_with_batch();
        // Phase ends 13:30:00. A reading at 13:30:20 is outside the window
        // even though its bucket (13:30) falls inside it.
        insert(
            &mut store,
            SensorStream::Temp1,
            &[(at(13, 29, 50), 30.0)],
        );
        insert(
            &mut store,
            SensorStream::Temp2,
            &[(at(13, 30, 20), 30.5)],
        );

        let diff = sensor_difference(&store, "B1", SensorFamily::Temp, CULTIVATION).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_multiple_phases_pool_readings() {
        let mut store = store_with_batch();
        store
            .insert_phases(&[NewPhase {
                start: at(13, 40, 0),
                end: at(13, 50, 0),
                phase: CULTIVATION.into(),
            }])
            .unwrap();
        insert(
            &mut store,
            SensorStream::Temp1,
            &[(at(12, 0, 0), 30.0), (at(13, 45, 0), 31.0)],
        );
        insert(
            &mut store,
            SensorStream::Temp2,
            &[(at(12, 0, 10), 30.2), (at(13, 45, 10), 31.5)],
        );

        let diff = sensor_difference(&store, "B1", SensorFamily::Temp, CULTIVATION).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].date, at(12, 0, 0));
        assert_eq!(diff[1].date, at(13, 45, 0));
        assert!((diff[1].difference - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_batch_and_empty_window_yield_empty() {
        let store = store_with_batch();
        assert!(sensor_difference(&store, "nope", SensorFamily::Temp, CULTIVATION)
            .unwrap()
            .is_empty());
        assert!(sensor_difference(&store, "B1", SensorFamily::Ph, CULTIVATION)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_combined_join_drops_unmatched_minutes() {
        let mut store = store_with_batch();
        // Temp pairs at 12:00 and 12:05; pH pairs at 12:05 only.
        insert(
            &mut store,
            SensorStream::Temp1,
            &[(at(12, 0, 0), 30.0), (at(12, 5, 0), 30.2)],
        );
        insert(
            &mut store,
            SensorStream::Temp2,
            &[(at(12, 0, 5), 30.4), (at(12, 5, 5), 30.8)],
        );
        insert(&mut store, SensorStream::Ph1, &[(at(12, 5, 2), 7.0)]);
        insert(&mut store, SensorStream::Ph2, &[(at(12, 5, 8), 7.2)]);

        let combined = combined_difference(&store, "B1", CULTIVATION).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].date, at(12, 5, 0));
        assert!((combined[0].temp_difference - 0.6).abs() < 1e-9);
        assert!((combined[0].ph_difference - 0.2).abs() < 1e-9);
    }
}
