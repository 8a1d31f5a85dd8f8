use serde::{Deserialize, Serialize};

use super::AuthConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Knowledge-base retrieval
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval endpoint; `/knowledgebases/{id}/retrieve`
    /// is appended per call.
    #[serde(default = "d_retrieval_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_20000u")]
    pub timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: d_retrieval_url(),
            auth: AuthConfig::default(),
            timeout_ms: 20_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Speech synthesis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Closed set of speech backends; unknown strings fail config parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechProviderKind {
    #[default]
    Elevenlabs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub provider: SpeechProviderKind,
    #[serde(default = "d_speech_url")]
    pub base_url: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProviderKind::default(),
            base_url: d_speech_url(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_retrieval_url() -> String {
    "http://127.0.0.1:4010".into()
}
fn d_speech_url() -> String {
    "https://api.elevenlabs.io/v1".into()
}
fn d_20000u() -> u64 {
    20_000
}
