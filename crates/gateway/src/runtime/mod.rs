//! Pipeline stages.
//!
//! Each stage is one stateless JSON-in/JSON-out call made by the workflow
//! executor. [`invoke`] is the single dispatch point used by both the
//! HTTP surface and `wave stage invoke`.

pub mod files;
pub mod respond;
pub mod session;
pub mod speech;
pub mod strategy;
pub mod sufficiency;
pub mod topic;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use wv_domain::error::{Error, Result};
use wv_domain::trace::TraceSink;
use wv_platform::{MediaFetcher, ObjectStore, WorkflowStarter};
use wv_providers::{ChatMessage, KnowledgeRetriever, ProviderRegistry, SpeechSynthesizer};
use wv_sessions::{MessageStore, SessionStore};

use crate::tenants::TenantStore;

/// Conversation turns fed to the generator and the strategy selector.
pub const HISTORY_LIMIT: usize = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pipeline context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings the stages read from the application config.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub session_idle: chrono::Duration,
    pub media_bucket: String,
    pub workflow_arn: String,
    pub canary_sender_ids: Vec<String>,
    pub tenant_defaults: wv_domain::config::TenantDefaultsConfig,
}

/// Every external dependency a stage may touch, built once per process.
#[derive(Clone)]
pub struct PipelineContext {
    pub llm: Arc<ProviderRegistry>,
    pub retriever: Arc<dyn KnowledgeRetriever>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sessions: Arc<dyn SessionStore>,
    pub messages: Arc<dyn MessageStore>,
    pub tenants: Arc<TenantStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaFetcher>,
    pub workflow: Arc<dyn WorkflowStarter>,
    pub sink: Arc<dyn TraceSink>,
    pub settings: PipelineSettings,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stage dispatch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SessionManager,
    TopicAnalyzer,
    ContextEvaluator,
    GenerateResponse,
    ReplyStrategy,
    TextToSpeech,
    GetFileContents,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::SessionManager,
        Stage::TopicAnalyzer,
        Stage::ContextEvaluator,
        Stage::GenerateResponse,
        Stage::ReplyStrategy,
        Stage::TextToSpeech,
        Stage::GetFileContents,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::SessionManager => "session-manager",
            Stage::TopicAnalyzer => "topic-analyzer",
            Stage::ContextEvaluator => "context-evaluator",
            Stage::GenerateResponse => "generate-response",
            Stage::ReplyStrategy => "reply-strategy",
            Stage::TextToSpeech => "text-to-speech",
            Stage::GetFileContents => "get-file-contents",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| Error::NotFound(format!("unknown stage '{s}'")))
    }
}

/// Run one stage on a JSON payload. `deadline` is when the executor will
/// stop waiting for this call.
pub async fn invoke(
    ctx: &PipelineContext,
    stage: Stage,
    input: Value,
    deadline: Instant,
) -> Result<Value> {
    let start = Instant::now();
    let out = match stage {
        Stage::SessionManager => to_value(session::resolve_session(ctx, from_value(input)?).await?),
        Stage::TopicAnalyzer => to_value(topic::analyze_topic(ctx, from_value(input)?).await),
        Stage::ContextEvaluator => {
            to_value(sufficiency::evaluate_context(ctx, from_value(input)?).await)
        }
        Stage::GenerateResponse => {
            to_value(respond::generate_response(ctx, from_value(input)?).await?)
        }
        Stage::ReplyStrategy => {
            to_value(strategy::select_reply_strategy(ctx, from_value(input)?).await?)
        }
        Stage::TextToSpeech => {
            to_value(speech::synthesize_speech(ctx, from_value(input)?, deadline).await?)
        }
        Stage::GetFileContents => to_value(files::get_file_contents(ctx, from_value(input)?).await?),
    };
    tracing::debug!(
        stage = %stage,
        ok = out.is_ok(),
        duration_ms = start.elapsed().as_millis() as u64,
        "stage finished"
    );
    out
}

fn from_value<T: DeserializeOwned>(input: Value) -> Result<T> {
    serde_json::from_value(input).map_err(|e| Error::Input(e.to_string()))
}

fn to_value<T: Serialize>(out: T) -> Result<Value> {
    Ok(serde_json::to_value(out)?)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shared helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The most recent conversation turns under `messages_key`, as chat turns.
pub(crate) async fn load_history(
    ctx: &PipelineContext,
    messages_key: &str,
) -> Result<Vec<ChatMessage>> {
    let records = ctx.messages.recent(messages_key, HISTORY_LIMIT).await?;
    Ok(records
        .into_iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content,
        })
        .collect())
}

/// Parse a model reply that should be a JSON object, tolerating prose or
/// code fences around it.
pub(crate) fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| Error::Parse(format!("{e}: {trimmed}"))),
        _ => Err(Error::Parse(format!("no JSON object in reply: {trimmed}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
        assert!(matches!(
            "summarize".parse::<Stage>(),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn lenient_parse_strips_fences() {
        #[derive(serde::Deserialize)]
        struct S {
            sufficient: bool,
        }
        let s: S = parse_lenient("```json\n{\"sufficient\": true}\n```").unwrap();
        assert!(s.sufficient);
        assert!(parse_lenient::<S>("nope").is_err());
    }
}
