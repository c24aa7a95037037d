//! Domain model — sensor streams, batch metadata, and phase intervals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase kind all stock reports are restricted to.
pub const CULTIVATION: &str = "cultivation";

/// Identifier errors. Requesting an unknown stream or family is a
/// programming error and is rejected at parse time, before any query runs.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("unknown sensor stream '{0}' (expected temp1, temp2, ph1 or ph2)")]
    UnknownStream(String),

    #[error("unknown sensor family '{0}' (expected temp or ph)")]
    UnknownFamily(String),
}

/// One of the four physical sensor streams.
///
/// Streams are independently sampled; nothing guarantees that two streams
/// share timestamps, even within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStream {
    Temp1,
    Temp2,
    Ph1,
    Ph2,
}

impl SensorStream {
    /// Every stream, in reporting column order.
    pub const ALL: [SensorStream; 4] = [
        SensorStream::Temp1,
        SensorStream::Temp2,
        SensorStream::Ph1,
        SensorStream::Ph2,
    ];

    /// Storage table name for this stream.
    pub fn table(&self) -> &'static str {
        match self {
            SensorStream::Temp1 => "temp1",
            SensorStream::Temp2 => "temp2",
            SensorStream::Ph1 => "ph1",
            SensorStream::Ph2 => "ph2",
        }
    }
}

impl fmt::Display for SensorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for SensorStream {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temp1" => Ok(SensorStream::Temp1),
            "temp2" => Ok(SensorStream::Temp2),
            "ph1" => Ok(SensorStream::Ph1),
            "ph2" => Ok(SensorStream::Ph2),
            _ => Err(ModelError::UnknownStream(s.to_string())),
        }
    }
}

/// A pair of physically redundant sensors measuring the same quantity at
/// approximately the same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFamily {
    Temp,
    Ph,
}

impl SensorFamily {
    /// The `(sensor1, sensor2)` stream pair of this family. Differences are
    /// always computed as `sensor2 − sensor1`.
    pub fn sensors(&self) -> (SensorStream, SensorStream) {
        match self {
            SensorFamily::Temp => (SensorStream::Temp1, SensorStream::Temp2),
            SensorFamily::Ph => (SensorStream::Ph1, SensorStream::Ph2),
        }
    }

    /// Human-readable panel title used by the chart adapter.
    pub fn label(&self) -> &'static str {
        match self {
            SensorFamily::Temp => "Temperature",
            SensorFamily::Ph => "PH",
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFamily::Temp => f.write_str("temp"),
            SensorFamily::Ph => f.write_str("ph"),
        }
    }
}

impl FromStr for SensorFamily {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temp" => Ok(SensorFamily::Temp),
            "ph" => Ok(SensorFamily::Ph),
            _ => Err(ModelError::UnknownFamily(s.to_string())),
        }
    }
}

/// A single time-stamped sample from one sensor stream. Immutable once
/// ingested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One production run's wall-clock lifetime, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Storage row id; also defines storage order.
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `None`, the literal `"NaN"` sentinel, or a `TEST` prefix mark the
    /// record as non-production.
    pub batch_id: Option<String>,
}

impl BatchInfo {
    /// Whether this batch participates in reporting: a batch id that is
    /// present, not the `"NaN"` sentinel, and not a `TEST` run.
    pub fn is_eligible(&self) -> bool {
        match self.batch_id.as_deref() {
            Some(id) => id != "NaN" && !id.starts_with("TEST"),
            None => false,
        }
    }
}

/// A batch lifetime as ingested, before storage assigns a row id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBatch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub batch_id: Option<String>,
}

/// A named sub-interval of process state (e.g. "cultivation"), as stored.
///
/// Phases carry no batch foreign key. A phase belongs to every batch whose
/// lifetime contains the phase's *start* instant; the phase may well end
/// after the batch does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPhase {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub phase: String,
}

/// A phase interval as ingested, before storage assigns a row id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhase {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub phase: String,
}

/// A phase interval resolved for a batch, detached from its row identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PhaseWindow {
    /// Phase duration in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end.timestamp() - self.start.timestamp()
    }
}
