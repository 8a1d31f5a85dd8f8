use std::sync::Arc;

use wv_domain::config::Config;
use wv_sessions::{JsonMessageStore, JsonSessionStore};

use crate::runtime::PipelineContext;
use crate::tenants::TenantStore;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Everything the stages and the router need.
    pub pipeline: PipelineContext,

    // ── Durable tables (flushed on shutdown) ──────────────────────────
    pub sessions: Arc<JsonSessionStore>,
    pub messages: Arc<JsonMessageStore>,
    pub tenants: Arc<TenantStore>,
}

impl AppState {
    /// Write every table to disk. Failures are logged, not returned, so
    /// one bad table does not keep the others from being saved.
    pub fn flush(&self) {
        if let Err(e) = self.sessions.flush() {
            tracing::warn!(error = %e, "session table flush failed");
        }
        if let Err(e) = self.messages.flush() {
            tracing::warn!(error = %e, "message table flush failed");
        }
        if let Err(e) = self.tenants.flush() {
            tracing::warn!(error = %e, "tenant table flush failed");
        }
    }
}
