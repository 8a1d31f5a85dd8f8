//! Shared fakes for the gateway integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use wv_domain::config::{Config, TenantDefaultsConfig, MODEL_ROLES};
use wv_domain::conversation::{ConversationMessage, Role};
use wv_domain::error::{Error, Result};
use wv_domain::trace::{RecordingSink, TraceEvent};
use wv_gateway::bootstrap::pipeline_settings;
use wv_gateway::runtime::PipelineContext;
use wv_gateway::state::AppState;
use wv_gateway::tenants::TenantStore;
use wv_platform::{FsObjectStore, MediaFetcher, WorkflowStarter};
use wv_providers::{
    ChatRequest, ChatResponse, KnowledgeRetriever, LlmProvider, ProviderRegistry,
    SpeechSynthesizer, SynthesisRequest,
};
use wv_sessions::{JsonMessageStore, JsonSessionStore, MessageStore};

pub const TENANT_KEY: &str = "arn:aws:social-messaging:eu-west-1:1:phone-number-id/pn-1";
pub const WORKFLOW_ARN: &str = "arn:aws:states:eu-west-1:1:stateMachine:turn";
pub const CANARY_SENDER: &str = "390000000001";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fakes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Model provider answering from a queue and keeping every request.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_owned()));
    }

    pub fn fail(&self, err: Error) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let next = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(Error::Provider {
                provider: "scripted".into(),
                message: "no scripted reply left".into(),
            })
        })?;
        Ok(ChatResponse {
            content: next,
            usage: None,
            model: req.model.clone().unwrap_or_default(),
            finish_reason: Some("end_turn".into()),
        })
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub struct FakeRetriever {
    pub passages: Vec<String>,
    failure: Mutex<Option<Error>>,
    calls: Mutex<Vec<(String, u32, String)>>,
}

impl FakeRetriever {
    /// The next retrieval fails with `err`.
    pub fn fail(&self, err: Error) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<(String, u32, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeRetriever for FakeRetriever {
    async fn retrieve(&self, kb: &str, results: u32, query: &str) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((kb.to_owned(), results, query.to_owned()));
        if let Some(err) = self.failure.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.passages.clone())
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    timeouts: Mutex<Vec<Duration>>,
}

impl FakeSynthesizer {
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, req: &SynthesisRequest<'_>, timeout: Duration) -> Result<Vec<u8>> {
        self.timeouts.lock().unwrap().push(timeout);
        Ok(format!("OggS:{}", req.text).into_bytes())
    }
}

#[derive(Default)]
pub struct FakeMedia {
    fetched: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeMedia {
    async fn fetch(&self, media_id: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(media_id.to_owned());
        Ok(b"voice-note".to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct StartedExecution {
    pub target: String,
    pub name: String,
    pub input: Value,
}

#[derive(Default)]
pub struct FakeWorkflow {
    started: Mutex<Vec<StartedExecution>>,
}

impl FakeWorkflow {
    pub fn started(&self) -> Vec<StartedExecution> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowStarter for FakeWorkflow {
    async fn start(&self, target: &str, name: &str, input: &Value) -> Result<()> {
        self.started.lock().unwrap().push(StartedExecution {
            target: target.to_owned(),
            name: name.to_owned(),
            input: input.clone(),
        });
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Harness {
    pub ctx: PipelineContext,
    pub config: Arc<Config>,
    pub llm: Arc<ScriptedProvider>,
    pub retriever: Arc<FakeRetriever>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub media: Arc<FakeMedia>,
    pub workflow: Arc<FakeWorkflow>,
    pub sink: Arc<RecordingSink>,
    pub sessions: Arc<JsonSessionStore>,
    pub messages: Arc<JsonMessageStore>,
    pub tenants: Arc<TenantStore>,
    pub objects_root: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_passages(vec!["Gli ETF replicano un indice.".into()])
    }

    pub fn with_passages(passages: Vec<String>) -> Self {
        let mut config = Config::default();
        config.router.workflow_arn = WORKFLOW_ARN.into();
        config.router.canary_sender_ids = vec![CANARY_SENDER.into()];
        config.tenant_defaults = TenantDefaultsConfig {
            knowledge_base_id: Some("KB-DEFAULT".into()),
            system_prompt: Some("Sei un assistente.".into()),
            speech_api_key: Some("xi-test".into()),
            voice_id: Some("voice-1".into()),
        };

        let llm = Arc::new(ScriptedProvider::default());
        let mut registry = ProviderRegistry::default();
        registry.insert(llm.clone());
        for role in MODEL_ROLES {
            registry.assign(role, "scripted/test-model");
        }

        let retriever = Arc::new(FakeRetriever {
            passages,
            ..Default::default()
        });
        let synthesizer = Arc::new(FakeSynthesizer::default());
        let media = Arc::new(FakeMedia::default());
        let workflow = Arc::new(FakeWorkflow::default());
        let sink = Arc::new(RecordingSink::default());
        let sessions = Arc::new(JsonSessionStore::in_memory());
        let messages = Arc::new(JsonMessageStore::in_memory());
        let tenants = Arc::new(TenantStore::in_memory(config.tenant_defaults.clone()));
        let objects_root = tempfile::tempdir().unwrap();

        let ctx = PipelineContext {
            llm: Arc::new(registry),
            retriever: retriever.clone(),
            synthesizer: synthesizer.clone(),
            sessions: sessions.clone(),
            messages: messages.clone(),
            tenants: tenants.clone(),
            objects: Arc::new(FsObjectStore::new(objects_root.path())),
            media: media.clone(),
            workflow: workflow.clone(),
            sink: sink.clone(),
            settings: pipeline_settings(&config),
        };

        Self {
            ctx,
            config: Arc::new(config),
            llm,
            retriever,
            synthesizer,
            media,
            workflow,
            sink,
            sessions,
            messages,
            tenants,
            objects_root,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            config: self.config.clone(),
            pipeline: self.ctx.clone(),
            sessions: self.sessions.clone(),
            messages: self.messages.clone(),
            tenants: self.tenants.clone(),
        }
    }

    pub fn add_tenant(&self, name: &str) {
        self.tenants
            .put(wv_domain::tenant::TenantConfig::new(TENANT_KEY, name))
            .unwrap();
    }

    /// Store `n` alternating user/assistant turns under `pk`.
    pub async fn seed_history(&self, pk: &str, n: usize) {
        for i in 0..n {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            self.messages
                .append(ConversationMessage {
                    pk: pk.to_owned(),
                    sk: format!("M#{i:04}"),
                    role,
                    content: format!("turn {i}"),
                    kind: "text".into(),
                })
                .await
                .unwrap();
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.sink.events()
    }
}
