//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **rest**: reqwest adapters for the hosted backend's tables, audit
//!   procedure, role lookup and object storage.
//! - **notify**: sinks for user-visible notices.
//!
//! Adapters translate between domain types and wire representations. They
//! contain no business logic.

pub mod notify;
pub mod rest;
