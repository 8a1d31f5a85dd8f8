//! OpenAI-compatible chat completions adapter.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, vLLM, Ollama, LiteLLM). The system instruction is sent as the
//! first message with role `system`.

use std::time::Duration;

use serde_json::Value;
use wv_domain::config::ProviderConfig;
use wv_domain::error::{Error, Result};

use crate::traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
use crate::util::{from_reqwest, http_client, join_url, resolve_optional_key};

/// An LLM provider adapter for OpenAI-compatible endpoints.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    auth_header: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider from the deserialized provider config.
    ///
    /// Credentials are optional: local servers usually need none.
    pub fn from_config(cfg: &ProviderConfig, default_timeout_ms: u64) -> Result<Self> {
        let api_key = resolve_optional_key(&cfg.auth)?;
        let auth_header = cfg
            .auth
            .header
            .clone()
            .unwrap_or_else(|| "Authorization".into());
        let default_model = cfg.default_model.clone().unwrap_or_else(|| "gpt-4o".into());
        let timeout = Duration::from_millis(cfg.timeout_ms.unwrap_or(default_timeout_ms));

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_header,
            default_model,
            client: http_client(timeout)?,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let rb = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        match self.api_key {
            Some(ref key) if self.auth_header.eq_ignore_ascii_case("authorization") => {
                rb.bearer_auth(key)
            }
            Some(ref key) => rb.header(&self.auth_header, key),
            None => rb,
        }
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let mut messages: Vec<Value> = Vec::with_capacity(req.messages.len() + 1);
        if let Some(ref system) = req.system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.extend(req.messages.iter().map(|m| {
            serde_json::json!({"role": m.role.as_str(), "content": m.content})
        }));

        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

fn parse_chat_response(provider: &str, body: &Value) -> Result<ChatResponse> {
    let choice = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: provider.to_owned(),
            message: "no choices in response".into(),
        })?;

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Provider {
            provider: provider.to_owned(),
            message: "no message content in choice".into(),
        })?
        .to_string();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .map(String::from);

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(ChatResponse {
        content,
        usage: body.get("usage").and_then(parse_openai_usage),
        model,
        finish_reason,
    })
}

fn parse_openai_usage(v: &Value) -> Option<Usage> {
    Some(Usage {
        prompt_tokens: v.get("prompt_tokens")?.as_u64()? as u32,
        completion_tokens: v.get("completion_tokens")?.as_u64()? as u32,
        total_tokens: v.get("total_tokens")?.as_u64()? as u32,
    })
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = self.build_chat_body(req);

        tracing::debug!(provider = %self.id, url = %url, "openai_compat chat request");

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_chat_response(&self.id, &resp_json)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
