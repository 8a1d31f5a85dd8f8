//! Session table.
//!
//! One row per session, keyed by `session_id`, with a lookup by contact
//! that returns the most recently active row. Activeness is never stored:
//! it is derived from `last_active_at` by [`crate::lifecycle`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wv_domain::error::Result;

use crate::table::JsonTable;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Active,
}

/// A conversation session. Timestamps are stored as unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(rename = "wa_contact_id")]
    pub contact_id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_active_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub current_topic_id: Option<String>,
}

impl SessionRecord {
    /// A new active session started at `now`.
    pub fn start(contact_id: &str, current_topic_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            contact_id: contact_id.to_owned(),
            started_at: now,
            last_active_at: now,
            status: SessionStatus::Active,
            current_topic_id,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store port
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The most recently active session for a contact, if any.
    async fn latest_for_contact(&self, contact_id: &str) -> Result<Option<SessionRecord>>;

    /// Insert or replace a session row.
    async fn put(&self, record: SessionRecord) -> Result<()>;

    /// Set `last_active_at` on an existing row. Missing rows are ignored.
    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON-file implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session store backed by `sessions.json` under the state path.
pub struct JsonSessionStore {
    table: JsonTable<SessionRecord>,
}

impl JsonSessionStore {
    pub fn open(state_path: &Path) -> Result<Self> {
        Ok(Self {
            table: JsonTable::open(&state_path.join("sessions.json"))?,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            table: JsonTable::in_memory(),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.table.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.table.flush()
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn latest_for_contact(&self, contact_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self
            .table
            .filter(|r| r.contact_id == contact_id)
            .into_iter()
            .max_by_key(|r| (r.last_active_at, r.started_at)))
    }

    async fn put(&self, record: SessionRecord) -> Result<()> {
        let key = record.session_id.clone();
        self.table.put(&key, record)
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<()> {
        let found = self.table.update(session_id, |r| r.last_active_at = at)?;
        if !found {
            tracing::warn!(session_id, "touch on unknown session ignored");
        }
        Ok(())
    }
}
