//! Reporting core — temporal joins over the batch store.
//!
//! Relates three independent time axes (batch lifetime, phase lifetime,
//! sensor sampling) into per-batch summaries and aligned comparison series.
//! Every operation is a stateless read over an already-populated store,
//! passed in explicitly; an empty result is always a valid output, never an
//! error.

pub mod aggregate;
pub mod difference;
pub mod resolver;

pub use aggregate::{aggregate_all, aggregate_sensor, AggregateRow, SensorMean};
pub use difference::{
    bucket_minute, combined_difference, sensor_difference, CombinedDiffPoint, DiffPoint,
};
pub use resolver::resolve_phases;

use crate::store::{BatchStore, StoreResult};

/// All eligible batch ids, in storage order.
///
/// Reporting adapters iterate this to produce their per-batch outputs (one
/// chart per id, for example).
pub fn eligible_batch_ids(store: &BatchStore) -> StoreResult<Vec<String>> {
    let ids = store
        .batches()?
        .into_iter()
        .filter(|batch| batch.is_eligible())
        .filter_map(|batch| batch.batch_id)
        .collect();
    Ok(ids)
}
