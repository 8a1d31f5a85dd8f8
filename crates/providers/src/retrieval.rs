//! Knowledge-base retrieval.
//!
//! The retriever returns the text of the top passages for a query in the
//! order the endpoint ranked them. No caching and no retries: every
//! failure propagates to the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wv_domain::config::RetrievalConfig;
use wv_domain::error::{Error, Result};

use crate::util::{from_reqwest, http_client, join_url, resolve_optional_key};

/// Anything that can return ranked passages from a knowledge base.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        knowledge_base_id: &str,
        results: u32,
        query: &str,
    ) -> Result<Vec<String>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    text: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Retriever speaking the agent-runtime `retrieve` JSON shape over HTTP.
pub struct HttpKnowledgeRetriever {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpKnowledgeRetriever {
    pub fn new(cfg: &RetrievalConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_millis(cfg.timeout_ms))?,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: resolve_optional_key(&cfg.auth)?,
        })
    }
}

#[async_trait]
impl KnowledgeRetriever for HttpKnowledgeRetriever {
    async fn retrieve(
        &self,
        knowledge_base_id: &str,
        results: u32,
        query: &str,
    ) -> Result<Vec<String>> {
        let url = join_url(
            &self.base_url,
            &format!("knowledgebases/{knowledge_base_id}/retrieve"),
        );
        let body = RetrieveRequest {
            retrieval_query: RetrievalQuery { text: query },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: results,
                },
            },
        };

        tracing::debug!(knowledge_base_id, results, "knowledge base retrieve");

        let mut rb = self.http.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            rb = rb.bearer_auth(key);
        }
        let resp = rb.send().await.map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "retrieval".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let parsed: RetrieveResponse = resp.json().await.map_err(from_reqwest)?;
        Ok(parsed
            .retrieval_results
            .into_iter()
            .map(|r| r.content.text)
            .collect())
    }
}
