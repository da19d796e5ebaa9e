//! `AuditLogger` over the `log_audit_event` remote procedure.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::client::{BackendClient, CallFailure, endpoint};
use crate::domain::ports::{AuditAction, AuditEvent, AuditLogger, AuditLoggerError};

const LOG_AUDIT_EVENT: &str = "log_audit_event";

impl From<CallFailure> for AuditLoggerError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Transport(message) => Self::transport(message),
            CallFailure::Status { status, message } => Self::rejected(status, message),
        }
    }
}

#[derive(Debug, Serialize)]
struct LogAuditEventArgs<'a> {
    p_action: AuditAction,
    p_table_name: &'a str,
    p_record_id: String,
    p_old_values: Option<&'a Value>,
    p_new_values: Option<&'a Value>,
}

impl<'a> From<&'a AuditEvent> for LogAuditEventArgs<'a> {
    fn from(event: &'a AuditEvent) -> Self {
        Self {
            p_action: event.action,
            p_table_name: event.table.as_str(),
            p_record_id: event.record_id.to_string(),
            p_old_values: event.old_values.as_ref(),
            p_new_values: event.new_values.as_ref(),
        }
    }
}

/// Audit logger that calls the backend procedure once per event.
#[derive(Debug, Clone)]
pub struct RestAuditLogger {
    client: BackendClient,
}

impl RestAuditLogger {
    /// Record events through `client`.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditLogger for RestAuditLogger {
    async fn log_audit_event(&self, event: &AuditEvent) -> Result<(), AuditLoggerError> {
        let url = endpoint(self.client.base(), ["rest", "v1", "rpc", LOG_AUDIT_EVENT])
            .ok_or_else(|| AuditLoggerError::transport("no endpoint for audit procedure"))?;
        let request = self
            .client
            .request(Method::POST, url)
            .json(&LogAuditEventArgs::from(event));
        self.client.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Table;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    #[rstest]
    fn arguments_use_procedure_parameter_names() {
        let event = AuditEvent {
            action: AuditAction::Update,
            table: Table::Expenses,
            record_id: Uuid::nil(),
            old_values: Some(json!({"amount": 10})),
            new_values: Some(json!({"amount": 12})),
        };

        let args = serde_json::to_value(LogAuditEventArgs::from(&event)).expect("serialises");

        assert_eq!(
            args,
            json!({
                "p_action": "UPDATE",
                "p_table_name": "expenses",
                "p_record_id": "00000000-0000-0000-0000-000000000000",
                "p_old_values": {"amount": 10},
                "p_new_values": {"amount": 12},
            })
        );
    }

    #[rstest]
    fn missing_snapshots_serialise_as_null() {
        let event = AuditEvent {
            action: AuditAction::Insert,
            table: Table::Documents,
            record_id: Uuid::nil(),
            old_values: None,
            new_values: None,
        };

        let args = serde_json::to_value(LogAuditEventArgs::from(&event)).expect("serialises");

        assert_eq!(args["p_action"], "INSERT");
        assert!(args["p_old_values"].is_null());
    }
}
