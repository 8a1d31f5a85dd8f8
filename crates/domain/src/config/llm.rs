use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Model role used by the Response Generator.
pub const ROLE_GENERATOR: &str = "generator";
/// Model role used by the Topic Analyzer.
pub const ROLE_TOPIC: &str = "topic";
/// Model role used by the Context Sufficiency Evaluator.
pub const ROLE_JUDGE: &str = "judge";
/// Model role used by the Reply Strategy Selector.
pub const ROLE_STRATEGY: &str = "strategy";

/// Every role the pipeline resolves at startup.
pub const MODEL_ROLES: &[&str] = &[ROLE_GENERATOR, ROLE_TOPIC, ROLE_JUDGE, ROLE_STRATEGY];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_20000u")]
    pub default_timeout_ms: u64,
    /// Model roles: generator, topic, judge, strategy.
    #[serde(default)]
    pub roles: HashMap<String, RoleConfig>,
    /// Registered LLM providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 20_000,
            roles: HashMap::new(),
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Format: "provider_id/model_name"
    pub model: String,
}

impl RoleConfig {
    /// The provider id segment of `model`.
    pub fn provider_id(&self) -> &str {
        self.model.split('/').next().unwrap_or(&self.model)
    }

    /// The model segment of `model`, if one was given.
    pub fn model_name(&self) -> Option<&str> {
        self.model.split_once('/').map(|(_, m)| m).filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
    /// Per-provider request timeout; falls back to `llm.default_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Closed set of supported model backends. Unknown strings fail to parse,
/// which makes a misconfigured provider fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompat,
    Anthropic,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "x-api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "wave").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "anthropic-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl AuthConfig {
    /// `true` when no credential source is configured at all.
    pub fn is_empty(&self) -> bool {
        self.env.is_none() && self.key.is_none() && self.service.is_none()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_20000u() -> u64 {
    20_000
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
