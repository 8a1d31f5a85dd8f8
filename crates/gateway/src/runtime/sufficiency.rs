//! `context-evaluator`: does recalled history already answer the question?
//!
//! Every doubtful outcome resolves to `false` so the generator retrieves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wv_domain::config::ROLE_JUDGE;
use wv_domain::error::{Error, Result};
use wv_domain::trace::TraceEvent;
use wv_providers::{ChatMessage, ChatRequest};

use super::{parse_lenient, PipelineContext};

const JUDGE_INSTRUCTION: &str = "You are a context judge. Given a User Question and a set of \
Retrieved Memory/Context, decide if the Memory is sufficient to answer the question well.\n\
If yes, output {\"sufficient\": true}. If the Memory is irrelevant or empty and the question \
requires factual knowledge, output {\"sufficient\": false}.";

const JUDGE_MAX_TOKENS: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SufficiencyInput {
    #[serde(rename = "userInput", default)]
    pub user_input: String,
    /// A JSON list of turns or an already serialized string.
    #[serde(default)]
    pub history: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SufficiencyOutput {
    pub sufficient: bool,
}

#[derive(Debug, Deserialize)]
struct JudgeReply {
    #[serde(default)]
    sufficient: Option<bool>,
}

pub async fn evaluate_context(ctx: &PipelineContext, input: SufficiencyInput) -> SufficiencyOutput {
    let Some(history) = history_text(&input.history) else {
        tracing::debug!("empty history, context insufficient");
        return SufficiencyOutput { sufficient: false };
    };

    let sufficient = match ask_judge(ctx, &input.user_input, &history).await {
        Ok(v) => {
            ctx.sink.record(TraceEvent::SufficiencyJudged { sufficient: v });
            v
        }
        Err(e) => {
            tracing::warn!(error = %e, "context judge failed, assuming insufficient");
            ctx.sink.record(TraceEvent::SufficiencyFallback {
                reason: e.to_string(),
            });
            false
        }
    };
    SufficiencyOutput { sufficient }
}

/// History as prompt text, or `None` when there is nothing to judge.
fn history_text(history: &Value) -> Option<String> {
    match history {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

async fn ask_judge(ctx: &PipelineContext, question: &str, history: &str) -> Result<bool> {
    let model = ctx.llm.for_role(ROLE_JUDGE)?;
    let req = ChatRequest {
        system: Some(JUDGE_INSTRUCTION.into()),
        messages: vec![ChatMessage::user(format!(
            "Question: {question}\nMemory: {history}"
        ))],
        max_tokens: Some(JUDGE_MAX_TOKENS),
        ..Default::default()
    };
    let resp = model.chat(req, ctx.sink.as_ref()).await?;
    let reply: JudgeReply = parse_lenient(&resp.content)?;
    reply
        .sufficient
        .ok_or_else(|| Error::Parse("judge reply has no 'sufficient' field".into()))
}
