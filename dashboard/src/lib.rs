//! Role-gated data layer for a student body organisation dashboard.
//!
//! The crate mirrors seven backend tables (budget allocations, expenses,
//! events, announcements, officers, documents and the audit trail) behind
//! accessors that check the caller's role before every mutation, keep a
//! local ordered copy of each table, and report outcomes as notices. The
//! financial aggregator turns the mirrored budgets and expenses into the
//! totals, variances and risk tiers the role dashboards display.
//!
//! - [`domain`]: entities, role authority, accessors, aggregator and ports.
//! - [`outbound`]: HTTP adapters for the hosted backend and notice sinks.
//! - [`config`]: connection settings.
//! - [`telemetry`]: tracing bootstrap.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
