//! Event Routes
//!
//! Endpoint for appending events to the store.
//!
//! - POST /api/v1/events - Batch of events
//!
//! The batch is validated as a whole; a single bad timestamp rejects it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{EventDto, IngestRequest, IngestResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{parse_timestamp, EventRecord};

/// Maximum number of events accepted per request
pub const MAX_BATCH_SIZE: usize = 10_000;

/// POST /api/v1/events
pub async fn ingest_events(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let Json(req) = payload?;

    if req.events.is_empty() {
        return Err(ApiError::Validation("Empty batch".to_string()));
    }

    if req.events.len() > MAX_BATCH_SIZE {
        return Err(ApiError::Validation(format!(
            "Batch size exceeds maximum of {MAX_BATCH_SIZE} events"
        )));
    }

    let events = req
        .events
        .iter()
        .enumerate()
        .map(|(index, dto)| to_record(index, dto))
        .collect::<ApiResult<Vec<_>>>()?;

    let accepted = state.store.append(&events).await?;
    tracing::info!(accepted, store = state.store.name(), "Ingested events");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "ok".to_string(),
            accepted,
        }),
    ))
}

fn to_record(index: usize, dto: &EventDto) -> ApiResult<EventRecord> {
    if !dto.value.is_finite() {
        return Err(ApiError::Validation(format!(
            "events[{index}].value must be a finite number"
        )));
    }

    let timestamp = parse_timestamp(&dto.dt).map_err(|e| {
        ApiError::Validation(format!(
            "events[{index}].dt: cannot parse timestamp {:?} ({e})",
            dto.dt
        ))
    })?;

    Ok(EventRecord::new(timestamp, dto.value))
}
