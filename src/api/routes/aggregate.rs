//! Aggregate Routes
//!
//! Endpoint for building dense bucketed series.
//!
//! - POST /api/v1/aggregate - Gap-filled sums for a range and granularity

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AggregateRequest, SeriesResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::series::{Granularity, Series};
use crate::storage::{parse_timestamp, TimeRange};

/// POST /api/v1/aggregate
///
/// Build the dense series for `[dt_from, dt_upto]` grouped by `group_type`.
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AggregateRequest>, JsonRejection>,
) -> ApiResult<Json<SeriesResponse>> {
    let Json(req) = payload?;
    let series = run_aggregation(&state, &req).await?;
    Ok(Json(SeriesResponse::from(&series)))
}

/// Validate a request and run the aggregator under the request timeout
pub async fn run_aggregation(state: &AppState, req: &AggregateRequest) -> ApiResult<Series> {
    let (range, granularity) = parse_request(req)?;

    let timeout = state.config.request_timeout();
    let series = tokio::time::timeout(timeout, state.aggregator.aggregate(range, granularity))
        .await
        .map_err(|_| ApiError::Timeout(state.config.request_timeout_ms))??;

    Ok(series)
}

/// Parse the request's timestamps and group type
pub fn parse_request(req: &AggregateRequest) -> ApiResult<(TimeRange, Granularity)> {
    let start = parse_field("dt_from", &req.dt_from)?;
    let end = parse_field("dt_upto", &req.dt_upto)?;
    let granularity = Granularity::parse(&req.group_type)?;

    Ok((TimeRange::new(start, end), granularity))
}

fn parse_field(name: &str, value: &str) -> ApiResult<chrono::NaiveDateTime> {
    parse_timestamp(value).map_err(|e| {
        ApiError::Validation(format!(
            "{name}: cannot parse timestamp {value:?} ({e}), expected YYYY-MM-DDTHH:MM:SS"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesError;

    #[test]
    fn test_parse_request() {
        let req = AggregateRequest::new("2022-09-01T00:00:00", "2022-12-31T23:59:00", "month");
        let (range, granularity) = parse_request(&req).unwrap();

        assert_eq!(granularity, Granularity::Month);
        assert_eq!(range.start, parse_timestamp("2022-09-01T00:00:00").unwrap());
        assert_eq!(range.end, parse_timestamp("2022-12-31T23:59:00").unwrap());
    }

    #[test]
    fn test_parse_request_bad_timestamp() {
        let req = AggregateRequest::new("2022-09-01", "2022-12-31T23:59:00", "month");
        assert!(matches!(parse_request(&req), Err(ApiError::Validation(msg)) if msg.starts_with("dt_from")));

        let req = AggregateRequest::new("2022-09-01T00:00:00", "yesterday", "day");
        assert!(matches!(parse_request(&req), Err(ApiError::Validation(msg)) if msg.starts_with("dt_upto")));
    }

    #[test]
    fn test_parse_request_bad_group_type() {
        let req = AggregateRequest::new("2022-09-01T00:00:00", "2022-12-31T23:59:00", "week");
        assert!(matches!(
            parse_request(&req),
            Err(ApiError::Series(SeriesError::InvalidGranularity(_)))
        ));
    }
}
