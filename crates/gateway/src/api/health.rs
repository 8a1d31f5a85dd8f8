use axum::extract::State;
use axum::response::Json;

use crate::state::AppState;

/// `GET /v1/health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.pipeline.llm.list_providers(),
        "roles": state.pipeline.llm.list_roles(),
        "tenants": state.tenants.len(),
    }))
}
