//! Per-tenant settings.
//!
//! A tenant is one business phone number. Its record is keyed by the phone
//! number ARN and carries the generation options used by the Response
//! Generator and the voice options used by speech synthesis. Records are
//! immutable for the duration of a turn.

use serde::{Deserialize, Serialize};

use crate::config::TenantDefaultsConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tenant record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(rename = "wa_phone_number_arn")]
    pub tenant_key: String,
    pub name: String,
    #[serde(rename = "response_generator", default)]
    pub generation: GenerationOptions,
    #[serde(rename = "text_to_speech", default)]
    pub speech: SpeechOptions,
}

impl TenantConfig {
    /// A fresh record with built-in defaults for every option.
    pub fn new(tenant_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_key: tenant_key.into(),
            name: name.into(),
            generation: GenerationOptions::default(),
            speech: SpeechOptions::default(),
        }
    }

    /// Fill unset string options from the deployment defaults.
    pub fn apply_defaults(&mut self, defaults: &TenantDefaultsConfig) {
        self.generation.apply_defaults(defaults);
        self.speech.apply_defaults(defaults);
    }

    /// Phone number id: the segment after the last `/` of the tenant key.
    pub fn phone_number_id(&self) -> &str {
        phone_number_id(&self.tenant_key)
    }
}

fn fill(slot: &mut Option<String>, fallback: &Option<String>) {
    if slot.as_deref().map_or(true, str::is_empty) {
        if let Some(v) = fallback {
            *slot = Some(v.clone());
        }
    }
}

/// Extract the phone number id from a phone number ARN
/// (`arn:aws:social-messaging:…:phone-number-id/abc123` → `abc123`).
pub fn phone_number_id(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub knowledge_base_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Passages requested from the knowledge base per turn.
    #[serde(default = "d_4")]
    pub retrieval_results: u32,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_4096")]
    pub max_tokens: u32,
}

impl GenerationOptions {
    pub fn apply_defaults(&mut self, defaults: &TenantDefaultsConfig) {
        fill(&mut self.knowledge_base_id, &defaults.knowledge_base_id);
        fill(&mut self.system_prompt, &defaults.system_prompt);
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            knowledge_base_id: None,
            system_prompt: None,
            retrieval_results: d_4(),
            temperature: d_temperature(),
            max_tokens: d_4096(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Speech options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Provider output format, e.g. `opus_48000_32` or `mp3_44100_128`.
    #[serde(default = "d_output_format")]
    pub output_format: String,
    #[serde(default = "d_stability")]
    pub stability: f32,
    #[serde(default)]
    pub use_speaker_boost: Option<bool>,
    #[serde(default = "d_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "d_style")]
    pub style: f32,
    #[serde(default)]
    pub speed: Option<f32>,
    /// Upper bound for the synthesis request, in seconds.
    #[serde(default = "d_request_timeout")]
    pub request_timeout: f64,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: None,
            output_format: d_output_format(),
            stability: d_stability(),
            use_speaker_boost: None,
            similarity_boost: d_similarity_boost(),
            style: d_style(),
            speed: None,
            request_timeout: d_request_timeout(),
        }
    }
}

impl SpeechOptions {
    pub fn apply_defaults(&mut self, defaults: &TenantDefaultsConfig) {
        fill(&mut self.api_key, &defaults.speech_api_key);
        fill(&mut self.voice_id, &defaults.voice_id);
    }

    /// File extension for the configured output format.
    ///
    /// Only the opus family is stored today; it lands in an Ogg container.
    pub fn file_extension(&self) -> Option<&'static str> {
        if self.output_format.starts_with("opus") {
            Some("ogg")
        } else {
            None
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_4() -> u32 {
    4
}
fn d_temperature() -> f32 {
    0.5
}
fn d_4096() -> u32 {
    4096
}
fn d_output_format() -> String {
    "opus_48000_32".into()
}
fn d_stability() -> f32 {
    0.76
}
fn d_similarity_boost() -> f32 {
    0.88
}
fn d_style() -> f32 {
    0.10
}
fn d_request_timeout() -> f64 {
    58.0
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
