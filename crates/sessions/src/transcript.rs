//! Conversation message table.
//!
//! Messages are partitioned by `pk` and ordered by `sk`. Only rows whose
//! sort key starts with `M#` are messages; readers only ever take a
//! bounded suffix of them.

use std::path::Path;

use async_trait::async_trait;

use wv_domain::conversation::ConversationMessage;
use wv_domain::error::Result;

use crate::table::JsonTable;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The last `limit` messages under `pk`, oldest first.
    async fn recent(&self, pk: &str, limit: usize) -> Result<Vec<ConversationMessage>>;

    /// Append (or replace, on equal `sk`) one record.
    async fn append(&self, message: ConversationMessage) -> Result<()>;
}

/// Message store backed by `messages.json` under the state path.
pub struct JsonMessageStore {
    table: JsonTable<Vec<ConversationMessage>>,
}

impl JsonMessageStore {
    pub fn open(state_path: &Path) -> Result<Self> {
        Ok(Self {
            table: JsonTable::open(&state_path.join("messages.json"))?,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            table: JsonTable::in_memory(),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.table.flush()
    }
}

#[async_trait]
impl MessageStore for JsonMessageStore {
    async fn recent(&self, pk: &str, limit: usize) -> Result<Vec<ConversationMessage>> {
        if pk.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let mut messages: Vec<ConversationMessage> = self
            .table
            .get(pk)
            .unwrap_or_default()
            .into_iter()
            .filter(ConversationMessage::is_message)
            .collect();
        messages.sort_by(|a, b| a.sk.cmp(&b.sk));
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    async fn append(&self, message: ConversationMessage) -> Result<()> {
        let pk = message.pk.clone();
        self.table.upsert(&pk, |rows| {
            rows.retain(|m| m.sk != message.sk);
            rows.push(message);
        })
    }
}
