//! `POST /v1/stages/:stage`: one workflow task call.
//!
//! The executor sends the remaining execution budget in
//! `x-remaining-time-ms`; without it the configured stage timeout applies
//! from request arrival.

use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};

use crate::runtime::{self, Stage};
use crate::state::AppState;

use super::error_response;

pub const REMAINING_TIME_HEADER: &str = "x-remaining-time-ms";

pub async fn invoke_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    headers: HeaderMap,
    Json(input): Json<serde_json::Value>,
) -> Response {
    let arrived = Instant::now();
    let stage: Stage = match stage.parse() {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };
    let budget = remaining_budget(&headers)
        .unwrap_or_else(|| Duration::from_millis(state.config.server.stage_timeout_ms));
    let deadline = arrived + budget;

    match runtime::invoke(&state.pipeline, stage, input, deadline).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => {
            tracing::warn!(stage = %stage, error = %e, kind = e.kind(), "stage failed");
            error_response(&e)
        }
    }
}

fn remaining_budget(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(REMAINING_TIME_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn budget_header_is_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(remaining_budget(&headers), None);
        headers.insert(REMAINING_TIME_HEADER, HeaderValue::from_static("4500"));
        assert_eq!(remaining_budget(&headers), Some(Duration::from_millis(4500)));
        headers.insert(REMAINING_TIME_HEADER, HeaderValue::from_static("soon"));
        assert_eq!(remaining_budget(&headers), None);
    }
}
