//! Per-batch aggregation — one mean per sensor stream per resolved phase.

use crate::model::SensorStream;
use crate::report::resolver::resolve_phases;
use crate::store::{BatchStore, StoreResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// One aggregation group: a batch, one resolved phase duration, and the mean
/// of a sensor stream's readings inside that window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorMean {
    pub batch_id: String,
    /// Phase duration in whole seconds.
    pub phase_duration: i64,
    pub mean: f64,
}

/// One row of the wide per-batch report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub batch_id: String,
    /// Phase duration in whole seconds, taken from the temp1 groups.
    pub batch_duration: i64,
    pub avg_temp1: f64,
    pub avg_temp2: f64,
    pub avg_ph1: f64,
    pub avg_ph2: f64,
}

/// Mean of `stream` per eligible batch, restricted to the batch's resolved
/// `kind` phase windows.
///
/// Groups by `(batch_id, phase_duration)`: a batch with several same-kind
/// phases yields one group per distinct duration, and same-duration phases
/// pool their readings into a single group. A window with zero readings
/// produces no group at all — the mean is undefined, not null. Output is
/// ordered by `(batch_id, phase_duration)` so repeated runs are identical.
pub fn aggregate_sensor(
    store: &BatchStore,
    stream: SensorStream,
    kind: &str,
) -> StoreResult<Vec<SensorMean>> {
    // (batch_id, duration) -> (sum, count)
    let mut groups: BTreeMap<(String, i64), (f64, u64)> = BTreeMap::new();

    for batch in store.batches()? {
        if !batch.is_eligible() {
            continue;
        }
        let Some(batch_id) = batch.batch_id.clone() else {
            continue;
        };
        for window in resolve_phases(store, &batch, kind)? {
            let readings = store.readings_between(stream, window.start, window.end)?;
            if readings.is_empty() {
                continue;
            }
            let group = groups
                .entry((batch_id.clone(), window.duration_secs()))
                .or_insert((0.0, 0));
            for reading in &readings {
                group.0 += reading.value;
                group.1 += 1;
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|((batch_id, phase_duration), (sum, count))| SensorMean {
            batch_id,
            phase_duration,
            mean: sum / count as f64,
        })
        .collect())
}

/// The wide table: the four per-stream aggregates inner-joined on batch id.
///
/// A batch missing a mean for any one stream is dropped entirely — there are
/// no null cells. The join key is the batch id alone, not the duration, so a
/// batch whose phases have several distinct durations contributes the cross
/// product of its per-stream groups: duplicate batch_id rows with differing
/// durations. That duplication is kept as observed upstream rather than
/// merged; callers that need one row per batch must deduplicate themselves.
pub fn aggregate_all(store: &BatchStore, kind: &str) -> StoreResult<Vec<AggregateRow>> {
    let temp1 = aggregate_sensor(store, SensorStream::Temp1, kind)?;
    let temp2 = aggregate_sensor(store, SensorStream::Temp2, kind)?;
    let ph1 = aggregate_sensor(store, SensorStream::Ph1, kind)?;
    let ph2 = aggregate_sensor(store, SensorStream::Ph2, kind)?;

    let mut rows = Vec::new();
    for t1 in &temp1 {
        for t2 in temp2.iter().filter(|m| m.batch_id == t1.batch_id) {
            for p1 in ph1.iter().filter(|m| m.batch_id == t1.batch_id) {
                for p2 in ph2.iter().filter(|m| m.batch_id == t1.batch_id) {
                    rows.push(AggregateRow {
                        batch_id: t1.batch_id.clone(),
                        batch_duration: t1.phase_duration,
                        avg_temp1: t1.mean,
                        avg_temp2: t2.mean,
                        avg_ph1: p1.mean,
                        avg_ph2: p2.mean,
                    });
                }
            }
        }
    }
    Ok(rows)
}
