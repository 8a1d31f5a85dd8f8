use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions & storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// A session resumes while `now - last_active_at` is below this window.
    #[serde(default = "d_30")]
    pub idle_minutes: u32,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { idle_minutes: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON tables (`sessions.json`, `tenants.json`,
    /// `messages.json`).
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
        }
    }
}

/// Deployment-wide fallbacks applied to tenant records whose string
/// settings are unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TenantDefaultsConfig {
    #[serde(default)]
    pub knowledge_base_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub speech_api_key: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

fn d_30() -> u32 {
    30
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}
