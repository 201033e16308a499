//! # Onboarding Entry Point
//!
//! Loads configuration, then onboards one employee described on the command line.

use clap::Parser;
use onboarding::{
    config::ConfigLoader, models::EmployeeRecord, orchestrator::Orchestrator, secret::Secret,
    telemetry,
};
use tracing::debug;

/// Provision a new hire across directory, conferencing, file share and chat
#[derive(Parser)]
#[command(name = "onboard", version, about)]
struct Cli {
    /// Primary email of the new hire
    #[arg(long, default_value = "newhire123@yourcorpdomain.com")]
    email: String,

    #[arg(long, default_value = "John")]
    first_name: String,

    #[arg(long, default_value = "Doe")]
    last_name: String,

    /// Directory org unit path
    #[arg(long, default_value = "/Users/New Employees")]
    org_unit: String,

    /// Initial directory password; falls back to the configured default
    #[arg(long, env = "ONBOARD_EMPLOYEE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    debug!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        debug!(config = %redacted_json, "Configuration");
    }

    let mut employee =
        EmployeeRecord::new(cli.email, cli.first_name, cli.last_name)?.with_org_unit(cli.org_unit);
    if let Some(password) = cli.password {
        employee = employee.with_password(Secret::from(password));
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    // Provider failures are already logged; they do not change the exit status.
    let _outcome = orchestrator.onboard(&employee).await;

    Ok(())
}
