//! Domain primitives, services and ports.
//!
//! Purpose: model the organisation's budget, expense and records data, the
//! role gate in front of every mutation, and the reductions the dashboards
//! display. Nothing here knows how the hosted backend is reached; adapters
//! live in [`crate::outbound`].
//!
//! Public surface:
//! - [`DomainError`] / [`ErrorCode`]: failure taxonomy shared by every
//!   operation.
//! - [`Role`], [`RoleSet`], [`Session`]: the role authority.
//! - [`ResourceAccessor`]: generic fetch+mutate+mirror wrapper, one per
//!   entity in [`entities`].
//! - [`finance`]: the budget and expense aggregator.
//! - [`Workspace`]: the seven accessors bound to one session.

pub mod accessor;
pub mod audit_dispatch;
pub mod audit_trail;
pub mod dashboards;
pub mod entities;
pub mod error;
pub mod finance;
pub mod ports;
pub mod resource;
pub mod role;
pub mod session;
pub mod uploads;
pub mod workspace;

pub use self::accessor::{LoadState, ResourceAccessor};
pub use self::audit_dispatch::{AuditDispatcher, AuditWorker, AuditWorkerReport};
pub use self::dashboards::{Dashboard, DashboardKind};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::finance::SpendBasis;
pub use self::resource::{Placement, Resource, WritePolicy};
pub use self::role::{Role, RoleSet, UnknownRoleError};
pub use self::session::{Session, UserId, UserIdValidationError, resolve_session};
pub use self::uploads::{DocumentDetails, UploadFile, Uploads};
pub use self::workspace::{LoadFailure, SessionSwitch, Workspace};
