//! Speech synthesis.
//!
//! Synthesis runs inside a stage with a hard execution deadline, so every
//! request carries an explicit timeout computed by [`effective_timeout`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use wv_domain::config::SpeechConfig;
use wv_domain::error::{Error, Result};
use wv_domain::tenant::SpeechOptions;

use crate::util::{from_reqwest, http_client, join_url};

/// Margin kept between the synthesis call and the stage deadline.
pub const DEADLINE_MARGIN: Duration = Duration::from_secs(1);

/// Ceiling applied when a tenant configures a non-positive or NaN request timeout.
pub const FALLBACK_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for one synthesis request:
/// `min(configured ceiling, remaining execution time - 1s)`.
///
/// A ceiling too large for a [`Duration`] imposes no bound, leaving the
/// remaining budget. Fails with [`Error::Timeout`] when less than the
/// margin remains.
pub fn effective_timeout(configured_secs: f64, remaining: Duration) -> Result<Duration> {
    let budget = remaining.checked_sub(DEADLINE_MARGIN).unwrap_or_default();
    if budget.is_zero() {
        return Err(Error::Timeout(format!(
            "only {} ms of execution time left for speech synthesis",
            remaining.as_millis()
        )));
    }
    if configured_secs.is_nan() || configured_secs <= 0.0 {
        return Ok(FALLBACK_REQUEST_TIMEOUT.min(budget));
    }
    match Duration::try_from_secs_f64(configured_secs) {
        Ok(ceiling) => Ok(ceiling.min(budget)),
        Err(_) => Ok(budget),
    }
}

/// One synthesis job.
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub options: &'a SpeechOptions,
}

/// Anything that turns text into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, req: &SynthesisRequest<'_>, timeout: Duration) -> Result<Vec<u8>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ElevenLabs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_speaker_boost: Option<bool>,
    similarity_boost: f32,
    style: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

impl From<&SpeechOptions> for VoiceSettings {
    fn from(o: &SpeechOptions) -> Self {
        Self {
            stability: o.stability,
            use_speaker_boost: o.use_speaker_boost,
            similarity_boost: o.similarity_boost,
            style: o.style,
            speed: o.speed,
        }
    }
}

/// ElevenLabs streaming text-to-speech client. Credentials and voice come
/// from the tenant record on each call.
#[derive(Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ElevenLabsSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsSynthesizer")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ElevenLabsSynthesizer {
    pub fn new(cfg: &SpeechConfig) -> Result<Self> {
        // Per-request timeouts override this client-wide bound.
        Ok(Self {
            client: http_client(Duration::from_secs(300))?,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, req: &SynthesisRequest<'_>, timeout: Duration) -> Result<Vec<u8>> {
        let api_key = req
            .options
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Input("text_to_speech.api_key is not set".into()))?;
        let voice_id = req
            .options
            .voice_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Input("text_to_speech.voice_id is not set".into()))?;

        let url = join_url(&self.base_url, &format!("text-to-speech/{voice_id}/stream"));
        let body = TtsRequest {
            text: req.text,
            voice_settings: req.options.into(),
        };

        tracing::debug!(
            voice_id,
            output_format = %req.options.output_format,
            timeout_ms = timeout.as_millis() as u64,
            "elevenlabs synthesis request"
        );

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .query(&[("output_format", req.options.output_format.as_str())])
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "elevenlabs".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let bytes = resp.bytes().await.map_err(from_reqwest)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_applies_when_time_is_plentiful() {
        let t = effective_timeout(58.0, Duration::from_secs(300)).unwrap();
        assert_eq!(t, Duration::from_secs(58));
    }

    #[test]
    fn deadline_wins_and_keeps_one_second_margin() {
        let t = effective_timeout(58.0, Duration::from_millis(5_000)).unwrap();
        assert_eq!(t, Duration::from_secs(4));
    }

    #[test]
    fn unrepresentable_ceiling_leaves_the_remaining_budget() {
        let t = effective_timeout(1e20, Duration::from_millis(5_000)).unwrap();
        assert_eq!(t, Duration::from_secs(4));
        let t = effective_timeout(f64::INFINITY, Duration::from_millis(5_000)).unwrap();
        assert_eq!(t, Duration::from_secs(4));
        let t = effective_timeout(f64::NAN, Duration::from_secs(120)).unwrap();
        assert_eq!(t, FALLBACK_REQUEST_TIMEOUT);
    }

    #[test]
    fn no_time_left_is_a_timeout_error() {
        let err = effective_timeout(58.0, Duration::from_millis(800)).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        let err = effective_timeout(58.0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn non_positive_ceiling_uses_fallback() {
        let t = effective_timeout(0.0, Duration::from_secs(120)).unwrap();
        assert_eq!(t, FALLBACK_REQUEST_TIMEOUT);
    }

    #[test]
    fn voice_settings_skip_unset_fields() {
        let opts = SpeechOptions::default();
        let v = serde_json::to_value(VoiceSettings::from(&opts)).unwrap();
        assert!(v.get("speed").is_none());
        assert!(v.get("use_speaker_boost").is_none());
        assert!(v.get("stability").is_some());
    }
}
