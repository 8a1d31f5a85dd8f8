use parking_lot::Mutex;
use serde::Serialize;

/// Structured trace events emitted across all wave crates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        contact_id: String,
        session_id: String,
        is_new: bool,
        carried_topic_id: Option<String>,
    },
    TopicAnalyzed {
        topic_id: String,
        keywords: usize,
        duration_ms: u64,
    },
    TopicFallback {
        reason: String,
    },
    SufficiencyJudged {
        sufficient: bool,
    },
    SufficiencyFallback {
        reason: String,
    },
    ContextRetrieved {
        knowledge_base_id: String,
        passages: usize,
        duration_ms: u64,
    },
    ResponseGenerated {
        history_len: usize,
        with_context: bool,
        duration_ms: u64,
    },
    ReplyStrategySelected {
        mode: String,
        complexity_factor: f64,
    },
    SpeechSynthesized {
        bucket: String,
        key: String,
        bytes: usize,
        timeout_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    MediaStored {
        uri: String,
        bytes: usize,
    },
    WorkflowStarted {
        target: String,
        execution_name: String,
        message_kind: String,
    },
    InboundDropped {
        message_id: String,
        reason: String,
    },
}

impl TraceEvent {
    /// Fallback and drop events describe degraded turns.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Self::TopicFallback { .. } | Self::SufficiencyFallback { .. } | Self::InboundDropped { .. }
        )
    }

    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        if self.is_degraded() {
            tracing::warn!(trace_event = %json, "wv_event");
        } else {
            tracing::info!(trace_event = %json, "wv_event");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sinks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Destination for trace events. Every pipeline component receives one.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: TraceEvent) {
        event.emit();
    }
}

/// Keeps events in memory so callers can assert on them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}
