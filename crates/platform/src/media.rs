//! Inbound media download.
//!
//! Two hops: the media id resolves to a short-lived URL, and the URL
//! serves the bytes. Both requests carry the same bearer token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use wv_domain::config::MediaConfig;
use wv_domain::error::{Error, Result};
use wv_providers::util::{from_reqwest, http_client, join_url, resolve_optional_key};

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, media_id: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct MediaLocation {
    url: String,
}

#[derive(Debug, Clone)]
pub struct GraphMediaFetcher {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GraphMediaFetcher {
    pub fn new(cfg: &MediaConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_millis(cfg.timeout_ms))?,
            base_url: cfg.fetch_base_url.trim_end_matches('/').to_owned(),
            token: resolve_optional_key(&cfg.auth)?,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut rb = self.http.get(url);
        if let Some(ref token) = self.token {
            rb = rb.bearer_auth(token);
        }
        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "media".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl MediaFetcher for GraphMediaFetcher {
    async fn fetch(&self, media_id: &str) -> Result<Vec<u8>> {
        if media_id.is_empty() {
            return Err(Error::Input("media id is empty".into()));
        }
        let location: MediaLocation = self
            .get(&join_url(&self.base_url, media_id))
            .await?
            .json()
            .await
            .map_err(from_reqwest)?;

        let bytes = self
            .get(&location.url)
            .await?
            .bytes()
            .await
            .map_err(from_reqwest)?;
        tracing::debug!(media_id, bytes = bytes.len(), "media downloaded");
        Ok(bytes.to_vec())
    }
}
