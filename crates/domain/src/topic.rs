//! Topic identity.
//!
//! Two turns share a topic exactly when their labels are equal after
//! lower-casing. The id is the first 32 hex characters of the SHA-256 of
//! the lower-cased label.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Id used when no topic could be determined.
pub const GENERAL_TOPIC_ID: &str = "general";
/// Label used when the model omitted one or the analysis failed.
pub const GENERAL_TOPIC_NAME: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Topic {
    /// Build a topic from a model-provided label.
    pub fn from_label(label: &str, keywords: Vec<String>) -> Self {
        Self {
            topic_id: topic_id(label),
            topic_name: Some(label.to_owned()),
            keywords,
        }
    }
}

/// Deterministic id for a topic label.
pub fn topic_id(label: &str) -> String {
    let digest = Sha256::digest(label.to_lowercase().as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(32);
    id
}
