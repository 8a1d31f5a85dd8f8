//! External model, retrieval and speech adapters.
//!
//! Each external capability sits behind a trait (`LlmProvider`,
//! `KnowledgeRetriever`, `SpeechSynthesizer`) so the pipeline stages can
//! be exercised with scripted fakes.

pub mod anthropic;
pub mod openai_compat;
pub mod registry;
pub mod retrieval;
pub mod speech;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use registry::{ModelHandle, ProviderRegistry};
pub use retrieval::{HttpKnowledgeRetriever, KnowledgeRetriever};
pub use speech::{effective_timeout, ElevenLabsSynthesizer, SpeechSynthesizer, SynthesisRequest};
pub use traits::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, Usage};
