//! AppState construction shared by `serve` and the one-shot CLI commands.

use std::sync::Arc;

use anyhow::Context;

use wv_domain::config::{Config, ConfigSeverity, SpeechConfig, SpeechProviderKind};
use wv_domain::trace::TracingSink;
use wv_platform::{FsObjectStore, GraphMediaFetcher, HttpWorkflowStarter};
use wv_providers::{
    ElevenLabsSynthesizer, HttpKnowledgeRetriever, ProviderRegistry, SpeechSynthesizer,
};
use wv_sessions::{JsonMessageStore, JsonSessionStore};

use crate::runtime::{PipelineContext, PipelineSettings};
use crate::state::AppState;
use crate::tenants::TenantStore;

/// Log every config issue and fail when any of them is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

pub fn pipeline_settings(config: &Config) -> PipelineSettings {
    PipelineSettings {
        session_idle: chrono::Duration::minutes(i64::from(config.sessions.idle_minutes)),
        media_bucket: config.media.bucket.clone(),
        workflow_arn: config.router.workflow_arn.clone(),
        canary_sender_ids: config.router.canary_sender_ids.clone(),
        tenant_defaults: config.tenant_defaults.clone(),
    }
}

/// The synthesizer selected by `[speech] provider`.
fn speech_synthesizer(config: &SpeechConfig) -> anyhow::Result<Arc<dyn SpeechSynthesizer>> {
    let synthesizer: Arc<dyn SpeechSynthesizer> = match config.provider {
        SpeechProviderKind::Elevenlabs => Arc::new(
            ElevenLabsSynthesizer::new(config).context("initializing speech synthesizer")?,
        ),
    };
    tracing::info!(provider = ?config.provider, "speech synthesizer ready");
    Ok(synthesizer)
}

/// Validate config, open the tables, build every adapter and return a
/// fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    check_config(&config)?;

    // ── LLM providers ────────────────────────────────────────────────
    let llm = Arc::new(
        ProviderRegistry::from_config(&config.llm).context("initializing LLM providers")?,
    );
    let unresolved = llm.unresolved_roles();
    if !unresolved.is_empty() {
        anyhow::bail!(
            "model role(s) {} bound to a provider that failed to initialize",
            unresolved.join(", ")
        );
    }
    if llm.is_empty() {
        tracing::info!("no LLM providers initialized; model-backed stages will fail");
    } else {
        tracing::info!(
            providers = llm.len(),
            roles = ?llm.list_roles(),
            "LLM provider registry ready"
        );
    }

    // ── Retrieval & speech ───────────────────────────────────────────
    let retriever = Arc::new(
        HttpKnowledgeRetriever::new(&config.retrieval).context("initializing retriever")?,
    );
    let synthesizer = speech_synthesizer(&config.speech)?;

    // ── Tables ───────────────────────────────────────────────────────
    let state_path = &config.storage.state_path;
    let sessions = Arc::new(JsonSessionStore::open(state_path).context("opening session table")?);
    let messages = Arc::new(JsonMessageStore::open(state_path).context("opening message table")?);
    let tenants = Arc::new(
        TenantStore::open(state_path, config.tenant_defaults.clone())
            .context("opening tenant table")?,
    );
    tracing::info!(
        path = %state_path.display(),
        sessions = sessions.len(),
        tenants = tenants.len(),
        "tables loaded"
    );

    // ── Platform adapters ────────────────────────────────────────────
    let objects = Arc::new(FsObjectStore::new(config.media.object_root.clone()));
    let media = Arc::new(GraphMediaFetcher::new(&config.media).context("initializing media client")?);
    let workflow =
        Arc::new(HttpWorkflowStarter::new(&config.router).context("initializing workflow client")?);
    tracing::info!(
        object_root = %config.media.object_root.display(),
        bucket = %config.media.bucket,
        "object store ready"
    );

    let pipeline = PipelineContext {
        llm,
        retriever,
        synthesizer,
        sessions: sessions.clone(),
        messages: messages.clone(),
        tenants: tenants.clone(),
        objects,
        media,
        workflow,
        sink: Arc::new(TracingSink),
        settings: pipeline_settings(&config),
    };

    Ok(AppState {
        config,
        pipeline,
        sessions,
        messages,
        tenants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_domain::config::{ProviderConfig, ProviderKind, RoleConfig};

    #[test]
    fn settings_follow_config() {
        let mut config = Config::default();
        config.sessions.idle_minutes = 45;
        config.router.canary_sender_ids = vec!["39333".into()];
        let s = pipeline_settings(&config);
        assert_eq!(s.session_idle, chrono::Duration::minutes(45));
        assert_eq!(s.media_bucket, "wave-media");
        assert_eq!(s.canary_sender_ids, vec!["39333"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.sessions.idle_minutes = 0;
        assert!(check_config(&config).is_err());
    }

    #[test]
    fn default_config_boots_against_temp_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("state");
        config.media.object_root = dir.path().join("objects");
        let state = build_app_state(Arc::new(config)).unwrap();
        assert!(state.tenants.is_empty());
        assert!(state.pipeline.llm.is_empty());
        state.flush();
    }

    #[test]
    fn role_on_uninitialized_provider_fails_boot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("state");
        config.media.object_root = dir.path().join("objects");
        config.llm.providers.push(ProviderConfig {
            id: "claude".into(),
            kind: ProviderKind::Anthropic,
            base_url: "https://api.anthropic.com".into(),
            auth: Default::default(),
            default_model: None,
            timeout_ms: None,
        });
        config.llm.roles.insert(
            "generator".into(),
            RoleConfig {
                model: "claude/claude-3-5-sonnet".into(),
            },
        );
        let err = build_app_state(Arc::new(config)).err().unwrap();
        assert!(err.to_string().contains("generator"));
    }

    #[test]
    fn speech_provider_kind_selects_the_synthesizer() {
        let config = SpeechConfig::default();
        assert_eq!(config.provider, SpeechProviderKind::Elevenlabs);
        assert!(speech_synthesizer(&config).is_ok());
    }
}
