use serde::{Deserialize, Serialize};

/// Sort-key prefix marking a record as a conversation message.
pub const MESSAGE_SORT_PREFIX: &str = "M#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One stored turn of a conversation, partitioned by `pk` and ordered by
/// `sk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub pk: String,
    pub sk: String,
    pub role: Role,
    pub content: String,
    #[serde(rename = "type", default = "d_text")]
    pub kind: String,
}

impl ConversationMessage {
    pub fn is_message(&self) -> bool {
        self.sk.starts_with(MESSAGE_SORT_PREFIX)
    }
}

fn d_text() -> String {
    "text".into()
}
