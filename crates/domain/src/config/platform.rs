use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::AuthConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message router / workflow executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Base state machine ARN. Canary senders run this exact target; every
    /// other sender runs its `:live` alias.
    #[serde(default)]
    pub workflow_arn: String,
    /// Sender ids routed to the canary (development) target.
    #[serde(default)]
    pub canary_sender_ids: Vec<String>,
    /// Workflow executor endpoint (Step Functions JSON protocol).
    #[serde(default = "d_workflow_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_10000u")]
    pub timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            workflow_arn: String::new(),
            canary_sender_ids: Vec::new(),
            endpoint: d_workflow_endpoint(),
            auth: AuthConfig::default(),
            timeout_ms: 10_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Media
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Bucket receiving inbound audio and synthesized replies.
    #[serde(default = "d_bucket")]
    pub bucket: String,
    /// Local directory backing `s3://bucket/key` objects.
    #[serde(default = "d_object_root")]
    pub object_root: PathBuf,
    /// Messaging platform media API (`GET {base}/{media_id}`).
    #[serde(default = "d_fetch_url")]
    pub fetch_base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_10000u")]
    pub timeout_ms: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            bucket: d_bucket(),
            object_root: d_object_root(),
            fetch_base_url: d_fetch_url(),
            auth: AuthConfig::default(),
            timeout_ms: 10_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_workflow_endpoint() -> String {
    "http://127.0.0.1:4566".into()
}
fn d_bucket() -> String {
    "wave-media".into()
}
fn d_object_root() -> PathBuf {
    PathBuf::from("./data/objects")
}
fn d_fetch_url() -> String {
    "https://graph.facebook.com/v21.0".into()
}
fn d_10000u() -> u64 {
    10_000
}
