//! Workflow executor client.
//!
//! Starting an execution is fire-and-forget: the response body is ignored
//! beyond its status, and nothing deduplicates repeated starts.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use wv_domain::config::RouterConfig;
use wv_domain::error::{Error, Result};
use wv_providers::util::{from_reqwest, http_client, resolve_optional_key};

const START_EXECUTION_TARGET: &str = "AWSStepFunctions.StartExecution";
const AMZ_JSON: &str = "application/x-amz-json-1.0";

#[async_trait]
pub trait WorkflowStarter: Send + Sync {
    /// Start one execution of `target` named `name` with `input`.
    async fn start(&self, target: &str, name: &str, input: &serde_json::Value) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartExecution<'a> {
    state_machine_arn: &'a str,
    name: &'a str,
    /// The executor takes the input as a JSON-encoded string.
    input: String,
}

/// Starts executions over the Step Functions JSON protocol.
#[derive(Debug, Clone)]
pub struct HttpWorkflowStarter {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpWorkflowStarter {
    pub fn new(cfg: &RouterConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_millis(cfg.timeout_ms))?,
            endpoint: cfg.endpoint.trim_end_matches('/').to_owned(),
            api_key: resolve_optional_key(&cfg.auth)?,
        })
    }
}

#[async_trait]
impl WorkflowStarter for HttpWorkflowStarter {
    async fn start(&self, target: &str, name: &str, input: &serde_json::Value) -> Result<()> {
        if target.is_empty() {
            return Err(Error::Config("router.workflow_arn is not set".into()));
        }
        let body = StartExecution {
            state_machine_arn: target,
            name,
            input: serde_json::to_string(input)?,
        };

        let start = Instant::now();
        let mut rb = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", START_EXECUTION_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .body(serde_json::to_vec(&body)?);
        if let Some(ref key) = self.api_key {
            rb = rb.bearer_auth(key);
        }
        let resp = rb.send().await.map_err(from_reqwest)?;

        let status = resp.status();
        tracing::debug!(
            target,
            name,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "start execution"
        );
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "workflow".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }
        Ok(())
    }
}
