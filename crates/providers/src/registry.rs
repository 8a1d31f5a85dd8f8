//! Provider registry.
//!
//! Constructs and holds all configured LLM provider instances. At startup
//! the registry reads the [`LlmConfig`], resolves authentication, and
//! instantiates the adapter matching each provider's `kind`. Pipeline
//! stages then ask for a model by role.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use wv_domain::config::{LlmConfig, ProviderKind};
use wv_domain::error::{Error, Result};
use wv_domain::trace::{TraceEvent, TraceSink};

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::{ChatRequest, ChatResponse, LlmProvider};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds all instantiated LLM providers and role assignments.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    roles: HashMap<String, String>,
}

impl ProviderRegistry {
    /// Build the registry from the application's [`LlmConfig`].
    ///
    /// Providers that fail to initialize (usually missing credentials) are
    /// logged and skipped. A role that names a provider id absent from the
    /// config is a hard error.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut registry = Self::default();

        for pc in &config.providers {
            let result: Result<Arc<dyn LlmProvider>> = match pc.kind {
                ProviderKind::OpenaiCompat => {
                    OpenAiCompatProvider::from_config(pc, config.default_timeout_ms)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
                ProviderKind::Anthropic => {
                    AnthropicProvider::from_config(pc, config.default_timeout_ms)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
            };

            match result {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        "registered LLM provider"
                    );
                    registry.providers.insert(pc.id.clone(), provider);
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        error = %e,
                        "failed to initialize LLM provider, skipping"
                    );
                }
            }
        }

        for (role_name, role_cfg) in &config.roles {
            let provider_id = role_cfg.provider_id();
            if !config.providers.iter().any(|p| p.id == provider_id) {
                return Err(Error::Config(format!(
                    "role '{role_name}' references unknown provider '{provider_id}'"
                )));
            }
            registry.assign(role_name, &role_cfg.model);
        }

        Ok(registry)
    }

    /// Register (or replace) a provider under its own id.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers
            .insert(provider.provider_id().to_owned(), provider);
    }

    /// Assign a role to a `provider_id/model` spec.
    pub fn assign(&mut self, role: &str, model_spec: &str) {
        self.roles.insert(role.to_owned(), model_spec.to_owned());
    }

    /// Look up a provider by its config id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// Resolve the provider and model assigned to a role.
    pub fn for_role(&self, role: &str) -> Result<ModelHandle> {
        let spec = self
            .roles
            .get(role)
            .ok_or_else(|| Error::Config(format!("no model assigned to role '{role}'")))?;
        let (provider_id, model) = match spec.split_once('/') {
            Some((p, m)) if !m.is_empty() => (p, Some(m.to_owned())),
            Some((p, _)) => (p, None),
            None => (spec.as_str(), None),
        };
        let provider = self.get(provider_id).ok_or_else(|| {
            Error::Config(format!(
                "provider '{provider_id}' for role '{role}' is not initialized"
            ))
        })?;
        Ok(ModelHandle {
            role: role.to_owned(),
            model,
            provider,
        })
    }

    /// Assigned roles whose provider is not registered, sorted.
    pub fn unresolved_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .roles
            .keys()
            .filter(|role| self.for_role(role).is_err())
            .cloned()
            .collect();
        roles.sort();
        roles
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// List all registered provider IDs (sorted).
    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// List roles and their assigned model specs.
    pub fn list_roles(&self) -> HashMap<String, String> {
        self.roles.clone()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ModelHandle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider bound to the model configured for one role.
#[derive(Clone)]
pub struct ModelHandle {
    role: String,
    model: Option<String>,
    provider: Arc<dyn LlmProvider>,
}

impl ModelHandle {
    /// Send one request with the role's model and record an `LlmRequest`
    /// trace event.
    pub async fn chat(&self, mut req: ChatRequest, sink: &dyn TraceSink) -> Result<ChatResponse> {
        if req.model.is_none() {
            req.model = self.model.clone();
        }
        let start = Instant::now();
        let resp = self.provider.chat(&req).await?;

        sink.record(TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_owned(),
            model: resp.model.clone(),
            role: self.role.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        });

        Ok(resp)
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_domain::config::{ProviderConfig, RoleConfig};

    #[test]
    fn role_with_unknown_provider_fails() {
        let mut cfg = LlmConfig::default();
        cfg.roles.insert(
            "topic".into(),
            RoleConfig {
                model: "ghost/model".into(),
            },
        );
        let err = ProviderRegistry::from_config(&cfg).err().unwrap();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn provider_without_credentials_is_skipped() {
        let mut cfg = LlmConfig::default();
        cfg.providers.push(ProviderConfig {
            id: "claude".into(),
            kind: ProviderKind::Anthropic,
            base_url: "https://api.anthropic.com".into(),
            auth: Default::default(),
            default_model: None,
            timeout_ms: None,
        });
        cfg.roles.insert(
            "generator".into(),
            RoleConfig {
                model: "claude/claude-3-5-sonnet".into(),
            },
        );
        let registry = ProviderRegistry::from_config(&cfg).unwrap();
        assert!(registry.is_empty());
        let err = registry.for_role("generator").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(registry.unresolved_roles(), vec!["generator"]);
    }

    #[test]
    fn roles_on_missing_providers_are_unresolved() {
        let mut registry = ProviderRegistry::default();
        registry.assign("topic", "ghost/model");
        assert_eq!(registry.unresolved_roles(), vec!["topic"]);
        let empty = ProviderRegistry::default();
        assert!(empty.unresolved_roles().is_empty());
    }

    #[test]
    fn unassigned_role_is_config_error() {
        let registry = ProviderRegistry::default();
        assert!(matches!(
            registry.for_role("judge"),
            Err(Error::Config(_))
        ));
    }
}
