//! Domain types shared by every wave crate: configuration, tenant
//! settings, conversation records, topic identity, trace events and the
//! common error type.

pub mod config;
pub mod conversation;
pub mod error;
pub mod tenant;
pub mod topic;
pub mod trace;
