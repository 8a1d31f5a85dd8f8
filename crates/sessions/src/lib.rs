//! Durable conversation state for wave.
//!
//! Holds the three key-value tables the pipeline reads and writes:
//! sessions (indexed by contact), conversation messages (partitioned by
//! key, ordered by sort key) and the generic JSON table both are built on.
//! Tables are last-write-wins; nothing here locks across a
//! read-decide-write sequence.

pub mod lifecycle;
pub mod store;
pub mod table;
pub mod transcript;

pub use lifecycle::{decide, SessionDecision};
pub use store::{JsonSessionStore, SessionRecord, SessionStatus, SessionStore};
pub use table::JsonTable;
pub use transcript::{JsonMessageStore, MessageStore};
