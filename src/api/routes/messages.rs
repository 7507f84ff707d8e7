//! Message Routes
//!
//! Chat-style endpoint: the body is the raw text of a user message and the
//! response is the text to send back.
//!
//! - POST /api/v1/messages - Answer a chat message
//!
//! `/start` gets a greeting. Any other text is read as an aggregation
//! request; if it is not a valid one the reply explains the expected format.

use axum::{extract::State, http::HeaderMap};
use std::sync::Arc;

use crate::api::dto::{AggregateRequest, SeriesResponse, EXAMPLE_REQUEST};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::aggregate::run_aggregation;
use crate::api::state::AppState;

/// Header carrying the display name of the message author
pub const USER_NAME_HEADER: &str = "x-user-name";

const START_COMMAND: &str = "/start";

/// POST /api/v1/messages
pub async fn handle_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<String> {
    let user = headers
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("there");

    reply_to_message(&state, &body, user).await
}

/// Compute the reply for one message
///
/// Client mistakes produce a hint reply, not an error. Store failures and
/// timeouts are returned as errors.
pub async fn reply_to_message(state: &AppState, text: &str, user: &str) -> ApiResult<String> {
    let text = text.trim();

    if text == START_COMMAND {
        return Ok(greeting(user));
    }

    let req: AggregateRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            tracing::debug!("Message is not an aggregation request: {}", e);
            return Ok(invalid_request_hint());
        }
    };

    match run_aggregation(state, &req).await {
        Ok(series) => serde_json::to_string(&SeriesResponse::from(&series))
            .map_err(|e| ApiError::Internal(e.to_string())),
        Err(e) if e.is_client_error() => {
            tracing::debug!("Rejected message request: {}", e);
            Ok(invalid_request_hint())
        }
        Err(e) => Err(e),
    }
}

pub fn greeting(user: &str) -> String {
    format!("Hello, {user}!")
}

/// Reply sent for malformed requests
pub fn invalid_request_hint() -> String {
    format!("Invalid request.\nExample request:\n{EXAMPLE_REQUEST}")
}
