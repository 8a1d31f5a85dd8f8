//! wave gateway: stage endpoints, the inbound message router and the
//! `wave` CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod inbound;
pub mod runtime;
pub mod state;
pub mod tenants;
