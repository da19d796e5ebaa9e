//! Print the signed-in officer's financial overview as JSON.
//!
//! Connection settings come from `SBO_*` variables, flags or a config file
//! (see `sbo_dashboard::config::BackendSettings`).

use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tracing::{info, warn};

use sbo_dashboard::config::BackendSettings;
use sbo_dashboard::domain::finance::BudgetSummary;
use sbo_dashboard::domain::ports::{Notifier, TableGateway};
use sbo_dashboard::domain::{Dashboard, Role, Workspace, resolve_session};
use sbo_dashboard::outbound::notify::TracingNotifier;
use sbo_dashboard::outbound::rest::{BackendClient, RestRoleDirectory, RestTableGateway};
use sbo_dashboard::telemetry::init_tracing;

#[derive(Serialize)]
struct Report {
    user_id: String,
    role: Option<Role>,
    summary: BudgetSummary,
    dashboard: Option<Dashboard>,
    unavailable: Vec<&'static str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings =
        BackendSettings::load().map_err(|error| eyre!("failed to load settings: {error}"))?;
    let client = BackendClient::new(
        settings.api_url()?,
        &settings.credentials()?,
        settings.request_timeout(),
    )
    .wrap_err("failed to build backend client")?;

    let directory = RestRoleDirectory::new(client.clone());
    let session = resolve_session(&directory, settings.user_id()?).await;
    info!(user_id = %session.user_id(), role = ?session.role(), "session resolved");

    let tables: Arc<dyn TableGateway> = Arc::new(RestTableGateway::new(client));
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let mut workspace =
        Workspace::new(session, &tables, &notifier).with_spend_basis(settings.spend_basis());

    let failures = workspace.fetch_all().await;
    for failure in &failures {
        warn!(table = %failure.table, error = %failure.error, "collection unavailable");
    }

    let report = Report {
        user_id: session.user_id().to_string(),
        role: session.role(),
        summary: workspace.budget_summary(),
        dashboard: workspace.dashboard(),
        unavailable: failures.iter().map(|failure| failure.table.as_str()).collect(),
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;
    Ok(())
}
