//! `topic-analyzer`: label the turn's subject.
//!
//! Never fails. Empty text short-circuits without a model call; a failed
//! call or an unreadable reply keeps the prior topic.

use std::time::Instant;

use serde::Deserialize;

use wv_domain::config::ROLE_TOPIC;
use wv_domain::error::Result;
use wv_domain::topic::{Topic, GENERAL_TOPIC_ID, GENERAL_TOPIC_NAME};
use wv_domain::trace::TraceEvent;
use wv_providers::{ChatMessage, ChatRequest};

use super::{parse_lenient, PipelineContext};

const TOPIC_INSTRUCTION: &str = "You are a Topic Analyzer. Analyze the user input. \
Extract the main topic (1-2 words) and 3 keywords.\n\
If a Previous Topic is provided, check if the input is a continuation. If yes, reuse the \
same Topic ID (if it was passed as keyword, otherwise output the topic name).\n\
Output ONLY JSON: {\"topic\": \"string\", \"keywords\": [\"string\"]}";

const TOPIC_MAX_TOKENS: u32 = 300;

#[derive(Debug, Default, Deserialize)]
pub struct TopicInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub current_topic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicReply {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

pub async fn analyze_topic(ctx: &PipelineContext, input: TopicInput) -> Topic {
    let prior = input.current_topic_id.filter(|t| !t.is_empty());
    let text = input.text.unwrap_or_default();

    if text.trim().is_empty() {
        return Topic {
            topic_id: prior.unwrap_or_else(|| GENERAL_TOPIC_ID.into()),
            topic_name: None,
            keywords: Vec::new(),
        };
    }

    let start = Instant::now();
    match ask_model(ctx, &text, prior.as_deref()).await {
        Ok(topic) => {
            ctx.sink.record(TraceEvent::TopicAnalyzed {
                topic_id: topic.topic_id.clone(),
                keywords: topic.keywords.len(),
                duration_ms: start.elapsed().as_millis() as u64,
            });
            topic
        }
        Err(e) => {
            tracing::warn!(error = %e, "topic analysis failed, keeping prior topic");
            ctx.sink.record(TraceEvent::TopicFallback {
                reason: e.to_string(),
            });
            Topic {
                topic_id: prior.unwrap_or_else(|| GENERAL_TOPIC_ID.into()),
                topic_name: Some(GENERAL_TOPIC_NAME.into()),
                keywords: Vec::new(),
            }
        }
    }
}

async fn ask_model(ctx: &PipelineContext, text: &str, prior: Option<&str>) -> Result<Topic> {
    let model = ctx.llm.for_role(ROLE_TOPIC)?;
    let prompt = format!(
        "User Input: {text}\nPrevious Topic ID: {}",
        prior.unwrap_or("None")
    );
    let req = ChatRequest {
        system: Some(TOPIC_INSTRUCTION.into()),
        messages: vec![ChatMessage::user(prompt)],
        max_tokens: Some(TOPIC_MAX_TOKENS),
        ..Default::default()
    };
    let resp = model.chat(req, ctx.sink.as_ref()).await?;
    let reply: TopicReply = parse_lenient(&resp.content)?;

    let label = reply
        .topic
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| GENERAL_TOPIC_NAME.into());
    Ok(Topic::from_label(&label, reply.keywords))
}
