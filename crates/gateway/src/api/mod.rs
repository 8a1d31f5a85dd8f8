pub mod health;
pub mod inbound;
pub mod stages;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use wv_domain::error::Error;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health::health))
        // Messaging platform deliveries
        .route("/v1/inbound", post(inbound::inbound))
        // Workflow executor task calls
        .route("/v1/stages/:stage", post(stages::invoke_stage))
}

/// HTTP status for a domain error.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Input(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Provider { .. } | Error::Http(_) | Error::Parse(_) | Error::Json(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Io(_) | Error::Config(_) | Error::Auth(_) | Error::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `{errorType, errorMessage}` body the workflow executor matches on.
pub fn error_response(err: &Error) -> Response {
    (
        status_for(err),
        Json(serde_json::json!({
            "errorType": err.kind(),
            "errorMessage": err.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(status_for(&Error::Input("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::Parse("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&Error::Provider {
                provider: "anthropic".into(),
                message: "overloaded".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(&Error::Timeout("x".into())), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&Error::Other("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
