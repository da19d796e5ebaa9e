//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_logger;
mod notifier;
mod object_store;
mod role_directory;
mod table_gateway;

#[cfg(test)]
pub use audit_logger::MockAuditLogger;
pub use audit_logger::{AuditAction, AuditEvent, AuditLogger, AuditLoggerError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notice, NoticeLevel, Notifier};
#[cfg(test)]
pub use object_store::MockObjectStore;
pub use object_store::{Bucket, ObjectStore, ObjectStoreError};
#[cfg(test)]
pub use role_directory::MockRoleDirectory;
pub use role_directory::{RoleDirectory, RoleDirectoryError};
#[cfg(test)]
pub use table_gateway::MockTableGateway;
pub use table_gateway::{
    Filter, OrderBy, SelectQuery, Table, TableGateway, TableGatewayError,
};
