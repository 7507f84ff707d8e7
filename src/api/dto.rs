//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::series::Series;

/// Well-formed aggregation request shown to clients after a validation failure
pub const EXAMPLE_REQUEST: &str =
    r#"{"dt_from": "2022-09-01T00:00:00", "dt_upto": "2022-12-31T23:59:00", "group_type": "month"}"#;

// ============================================
// AGGREGATE DTOs
// ============================================

/// Aggregation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRequest {
    /// Range start, `YYYY-MM-DDTHH:MM:SS`
    pub dt_from: String,
    /// Range end (inclusive), `YYYY-MM-DDTHH:MM:SS`
    pub dt_upto: String,
    /// One of `hour`, `day`, `month`
    pub group_type: String,
}

impl AggregateRequest {
    pub fn new(
        dt_from: impl Into<String>,
        dt_upto: impl Into<String>,
        group_type: impl Into<String>,
    ) -> Self {
        Self {
            dt_from: dt_from.into(),
            dt_upto: dt_upto.into(),
            group_type: group_type.into(),
        }
    }
}

/// Dense series response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    /// Sums, index-aligned with `labels`
    #[serde(serialize_with = "serialize_dataset")]
    pub dataset: Vec<f64>,
    /// Bucket starts, `YYYY-MM-DDTHH:MM:SS`
    pub labels: Vec<String>,
}

impl From<&Series> for SeriesResponse {
    fn from(series: &Series) -> Self {
        Self {
            dataset: series.dataset.clone(),
            labels: series.label_strings(),
        }
    }
}

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Emit integral sums as JSON integers (`5`, not `5.0`)
fn serialize_dataset<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values {
        if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
            seq.serialize_element(&(*value as i64))?;
        } else {
            seq.serialize_element(value)?;
        }
    }
    seq.end()
}

// ============================================
// INGEST DTOs
// ============================================

/// Single event in an ingest request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDto {
    /// Event timestamp, `YYYY-MM-DDTHH:MM:SS`
    pub dt: String,
    /// Event value
    pub value: f64,
}

/// Batch ingest request
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<EventDto>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Status: "ok"
    pub status: String,
    /// Number of events stored
    pub accepted: usize,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Store status: ok, error
    pub store: String,
    /// Store backend name
    pub store_backend: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
