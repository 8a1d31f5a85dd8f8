//! `generate-response`: the reply text.
//!
//! Retrieved passages go into the current user turn, never into the
//! system prompt, so the tenant's system prompt is byte-identical across
//! turns. One generation call, no retry; every failure propagates.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use wv_domain::config::ROLE_GENERATOR;
use wv_domain::error::{Error, Result};
use wv_domain::tenant::GenerationOptions;
use wv_domain::trace::TraceEvent;
use wv_providers::{ChatMessage, ChatRequest};

use super::{load_history, PipelineContext};

#[derive(Debug, Deserialize)]
pub struct GenerateInput {
    #[serde(rename = "userInput")]
    pub user_input: String,
    #[serde(default)]
    pub config: GenerationOptions,
    #[serde(default = "d_true")]
    pub with_context: bool,
    #[serde(default)]
    pub messages_key: String,
}

fn d_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOutput {
    pub response: String,
}

pub async fn generate_response(ctx: &PipelineContext, input: GenerateInput) -> Result<GenerateOutput> {
    let start = Instant::now();
    let mut options = input.config;
    options.apply_defaults(&ctx.settings.tenant_defaults);

    let mut messages = load_history(ctx, &input.messages_key).await?;
    let history_len = messages.len();

    let turn = if input.with_context {
        let passages = retrieve_context(ctx, &options, &input.user_input).await?;
        user_turn_with_context(&passages, &input.user_input)
    } else {
        format!("Domanda:\n{}", input.user_input)
    };
    messages.push(ChatMessage::user(turn));

    let model = ctx.llm.for_role(ROLE_GENERATOR)?;
    let req = ChatRequest {
        system: options.system_prompt.clone().filter(|p| !p.is_empty()),
        messages,
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        model: None,
    };
    let resp = model.chat(req, ctx.sink.as_ref()).await?;

    ctx.sink.record(TraceEvent::ResponseGenerated {
        history_len,
        with_context: input.with_context,
        duration_ms: start.elapsed().as_millis() as u64,
    });
    Ok(GenerateOutput {
        response: resp.content,
    })
}

async fn retrieve_context(
    ctx: &PipelineContext,
    options: &GenerationOptions,
    query: &str,
) -> Result<Vec<String>> {
    let kb = options
        .knowledge_base_id
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Input("knowledge_base_id is required when with_context is set".into()))?;

    let start = Instant::now();
    let passages = ctx
        .retriever
        .retrieve(kb, options.retrieval_results, query)
        .await?;
    ctx.sink.record(TraceEvent::ContextRetrieved {
        knowledge_base_id: kb.to_owned(),
        passages: passages.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    });
    Ok(passages)
}

/// The current user turn carrying retrieved passages ahead of the question.
pub fn user_turn_with_context(passages: &[String], question: &str) -> String {
    format!(
        "INIZIO Contesto\n{}\nFINE Contesto\nDomanda:\n{question}",
        passages.join("\n\n")
    )
}
