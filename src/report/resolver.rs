//! Batch-phase resolution — which phase intervals belong to a batch.

use crate::model::{BatchInfo, PhaseWindow};
use crate::store::{BatchStore, StoreResult};

/// Resolve the phase windows of `kind` overlapping `batch`.
///
/// A phase belongs to the batch iff its *start* instant lies inside
/// `[batch.start, batch.end]`, both ends inclusive; containment is
/// one-directional, so the phase may end after the batch does. Zero matches
/// is a valid result — the batch simply contributes no rows downstream.
pub fn resolve_phases(
    store: &BatchStore,
    batch: &BatchInfo,
    kind: &str,
) -> StoreResult<Vec<PhaseWindow>> {
    let phases = store.phases_starting_between(kind, batch.start, batch.end)?;
    Ok(phases
        .into_iter()
        .map(|phase| PhaseWindow {
            start: phase.start,
            end: phase.end,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewPhase, CULTIVATION};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, 6, 0, 0).unwrap()
    }

    fn batch(start: DateTime<Utc>, end: DateTime<Utc>) -> BatchInfo {
        BatchInfo {
            id: 1,
            start,
            end,
            batch_id: Some("B1".to_string()),
        }
    }

    #[test]
    fn test_phase_start_containment_is_inclusive() {
        let mut store = BatchStore::open_in_memory().unwrap();
        let b = batch(t0(), t0() + Duration::hours(2));
        store
            .insert_phases(&[
                // Exactly at batch start and exactly at batch end: both in.
                NewPhase { start: b.start, end: b.start + Duration::hours(1), phase: CULTIVATION.into() },
                NewPhase { start: b.end, end: b.end + Duration::hours(1), phase: CULTIVATION.into() },
                // One second outside either bound: out.
                NewPhase {
                    start: b.start - Duration::seconds(1),
                    end: b.start + Duration::hours(1),
                    phase: CULTIVATION.into(),
                },
                NewPhase {
                    start: b.end + Duration::seconds(1),
                    end: b.end + Duration::hours(1),
                    phase: CULTIVATION.into(),
                },
            ])
            .unwrap();

        let windows = resolve_phases(&store, &b, CULTIVATION).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, b.start);
        assert_eq!(windows[1].start, b.end);
    }

    #[test]
    fn test_phase_kind_filter() {
        let mut store = BatchStore::open_in_memory().unwrap();
        let b = batch(t0(), t0() + Duration::hours(2));
        store
            .insert_phases(&[
                NewPhase {
                    start: t0() + Duration::minutes(10),
                    end: t0() + Duration::minutes(30),
                    phase: "sterilization".into(),
                },
                NewPhase {
                    start: t0() + Duration::minutes(40),
                    end: t0() + Duration::minutes(90),
                    phase: CULTIVATION.into(),
                },
            ])
            .unwrap();

        let windows = resolve_phases(&store, &b, CULTIVATION).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, t0() + Duration::minutes(40));
    }

    #[test]
    fn test_no_matching_phase_is_empty_not_error() {
        let store = BatchStore::open_in_memory().unwrap();
        let b = batch(t0(), t0() + Duration::hours(2));
        assert!(resolve_phases(&store, &b, CULTIVATION).unwrap().is_empty());
    }
}
