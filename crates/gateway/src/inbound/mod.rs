//! Message router: one inbound chat message in, one workflow execution out.
//!
//! [`envelope`] turns the platform's webhook delivery into an
//! [`InboundMessage`]; [`router`] picks the processor for its content
//! type, enriches the input and starts the execution.

pub mod envelope;
pub mod router;

pub use envelope::{normalize, Contact, InboundMessage, MessageContent};
pub use router::{execution_name, route, workflow_target, RouteOutcome};

/// Object key for a media file: `{phone_number_id}/{kind}/{filename}`.
pub fn media_key(phone_number_id: &str, kind: &str, filename: &str) -> String {
    format!("{phone_number_id}/{kind}/{filename}")
}
