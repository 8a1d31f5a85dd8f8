mod llm;
mod observability;
mod platform;
mod server;
mod services;
mod sessions;

pub use llm::*;
pub use observability::*;
pub use platform::*;
pub use server::*;
pub use services::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub tenant_defaults: TenantDefaultsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Any issue with
    /// [`ConfigSeverity::Error`] aborts `serve`.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.llm.providers.is_empty() {
            errors.push(ConfigError::warning(
                "llm.providers",
                "no LLM providers configured",
            ));
        }

        for (i, provider) in self.llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].id"),
                    "provider id must not be empty",
                ));
            }
            if provider.base_url.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].base_url"),
                    "provider base_url must not be empty",
                ));
            }
        }

        // Every pipeline role must resolve to a configured provider.
        for role in MODEL_ROLES {
            match self.llm.roles.get(*role) {
                None => errors.push(ConfigError::warning(
                    format!("llm.roles.{role}"),
                    "role not assigned; stages using it will fail",
                )),
                Some(rc) => {
                    let provider_id = rc.provider_id();
                    if !self.llm.providers.iter().any(|p| p.id == provider_id) {
                        errors.push(ConfigError::error(
                            format!("llm.roles.{role}.model"),
                            format!("unknown provider \"{provider_id}\""),
                        ));
                    }
                }
            }
        }

        if self.retrieval.base_url.is_empty() {
            errors.push(ConfigError::error(
                "retrieval.base_url",
                "base_url must not be empty",
            ));
        }

        if self.sessions.idle_minutes == 0 {
            errors.push(ConfigError::error(
                "sessions.idle_minutes",
                "idle_minutes must be greater than 0",
            ));
        }

        if self.router.workflow_arn.is_empty() {
            errors.push(ConfigError::warning(
                "router.workflow_arn",
                "no workflow target configured; inbound messages will be dropped",
            ));
        }

        if self.media.bucket.is_empty() {
            errors.push(ConfigError::error("media.bucket", "bucket must not be empty"));
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }

    /// `true` when [`Config::validate`] reports no error-level issues.
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|e| e.severity != ConfigSeverity::Error)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
