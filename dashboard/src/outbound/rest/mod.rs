//! Adapters for the hosted backend's HTTP surface.
//!
//! One [`BackendClient`] carries the base URL, credentials and timeout; each
//! port gets a thin adapter that shapes requests and maps responses.

mod client;
mod roles;
mod rpc;
mod storage;
mod table_gateway;

pub use client::{BackendClient, BackendClientError, Credentials};
pub use roles::RestRoleDirectory;
pub use rpc::RestAuditLogger;
pub use storage::RestObjectStore;
pub use table_gateway::RestTableGateway;
