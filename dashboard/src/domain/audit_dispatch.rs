//! Fire-and-forget delivery of audit events.
//!
//! Accessors hand committed mutations to an [`AuditDispatcher`], which only
//! enqueues. A background task drains the queue into the [`AuditLogger`]
//! port. Delivery failures are logged and counted; they never reach the
//! caller that triggered the mutation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ports::{AuditEvent, AuditLogger};

/// Sending half of the audit side-channel.
#[derive(Debug, Clone)]
pub struct AuditDispatcher {
    sender: mpsc::UnboundedSender<AuditEvent>,
}

/// Delivery counts reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditWorkerReport {
    /// Events the logger accepted.
    pub delivered: usize,
    /// Events the logger rejected.
    pub failed: usize,
}

/// Handle to the task draining the audit queue.
///
/// The task stops once every [`AuditDispatcher`] clone has been dropped and
/// the queue is empty.
#[derive(Debug)]
pub struct AuditWorker {
    handle: JoinHandle<AuditWorkerReport>,
}

impl AuditDispatcher {
    /// Start the audit worker on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(logger: Arc<dyn AuditLogger>) -> (Self, AuditWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(logger, receiver));
        (Self { sender }, AuditWorker { handle })
    }

    /// Queue `event` for delivery. Never blocks and never fails the caller.
    pub fn dispatch(&self, event: AuditEvent) {
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            warn!(
                table = %event.table,
                record_id = %event.record_id,
                action = %event.action,
                "audit worker stopped; dropping audit event"
            );
        }
    }
}

impl AuditWorker {
    /// Wait for the queue to drain and return the delivery counts.
    pub async fn join(self) -> AuditWorkerReport {
        match self.handle.await {
            Ok(report) => report,
            Err(error) => {
                warn!(error = %error, "audit worker terminated abnormally");
                AuditWorkerReport::default()
            }
        }
    }
}

async fn drain(
    logger: Arc<dyn AuditLogger>,
    mut receiver: mpsc::UnboundedReceiver<AuditEvent>,
) -> AuditWorkerReport {
    let mut report = AuditWorkerReport::default();
    while let Some(event) = receiver.recv().await {
        match logger.log_audit_event(&event).await {
            Ok(()) => {
                report.delivered = report.delivered.saturating_add(1);
                debug!(table = %event.table, record_id = %event.record_id, action = %event.action, "audit event recorded");
            }
            Err(error) => {
                report.failed = report.failed.saturating_add(1);
                warn!(
                    table = %event.table,
                    record_id = %event.record_id,
                    action = %event.action,
                    error = %error,
                    "audit event delivery failed"
                );
            }
        }
    }
    report
}
