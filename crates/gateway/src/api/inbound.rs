//! `POST /v1/inbound`: messaging platform deliveries.
//!
//! The handler returns once the workflow execution has been started; the
//! reply is produced by the workflow, not by this request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::inbound::{self, RouteOutcome};
use crate::state::AppState;

use super::error_response;

pub async fn inbound(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let message = match inbound::normalize(body) {
        Ok(Some(m)) => m,
        Ok(None) => {
            tracing::debug!("delivery carries no message, ignoring");
            return Json(json!({ "status": "ignored" })).into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed delivery");
            return error_response(&e);
        }
    };

    let message_id = message.message_id.clone();
    match inbound::route(&state.pipeline, message).await {
        Ok(RouteOutcome::Started {
            target,
            execution_name,
        }) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "started",
                "target": target,
                "execution_name": execution_name,
            })),
        )
            .into_response(),
        Ok(RouteOutcome::Dropped { reason }) => {
            Json(json!({ "status": "dropped", "reason": reason })).into_response()
        }
        Err(e) => {
            tracing::error!(message_id = %message_id, error = %e, "routing failed");
            error_response(&e)
        }
    }
}
