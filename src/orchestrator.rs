//! Onboarding orchestrator
//!
//! Runs every provider for one employee, in order, and records each outcome.
//! A failing provider never stops the ones after it.

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ConfigError};
use crate::http;
use crate::models::{EmployeeRecord, OutcomeRecord};
use crate::providers::{
    ChatNotifier, ConferencingProvisioner, DirectoryProvisioner, FileShareProvisioner, Provisioner,
};

pub struct Orchestrator {
    provisioners: Vec<Arc<dyn Provisioner>>,
}

impl Orchestrator {
    /// Run the given provisioners in exactly this order
    pub fn new(provisioners: Vec<Arc<dyn Provisioner>>) -> Self {
        Self { provisioners }
    }

    /// Directory, conferencing, file share, then chat, sharing one HTTP client
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = http::build_client(config.http_timeout())
            .map_err(|source| ConfigError::HttpClient { source })?;

        Ok(Self::new(vec![
            Arc::new(DirectoryProvisioner::new(
                client.clone(),
                config.directory.clone(),
            )),
            Arc::new(ConferencingProvisioner::new(
                client.clone(),
                config.conferencing.clone(),
            )),
            Arc::new(FileShareProvisioner::new(
                client.clone(),
                config.file_share.clone(),
            )),
            Arc::new(ChatNotifier::new(client, config.chat.clone())),
        ]))
    }

    pub fn provisioners(&self) -> &[Arc<dyn Provisioner>] {
        &self.provisioners
    }

    /// Onboard one employee across every provider
    pub async fn onboard(&self, employee: &EmployeeRecord) -> OutcomeRecord {
        let span = info_span!(
            "onboarding",
            run_id = %Uuid::new_v4(),
            email = %employee.email
        );
        self.run(employee).instrument(span).await
    }

    async fn run(&self, employee: &EmployeeRecord) -> OutcomeRecord {
        info!(
            email = %employee.email,
            name = %employee.full_name(),
            "Starting onboarding process for {}",
            employee.email
        );

        let mut outcome = OutcomeRecord::new();
        for provisioner in &self.provisioners {
            let result = provisioner.provision(employee).await;
            outcome.record(provisioner.kind(), result);
        }

        if outcome.all_succeeded() {
            info!(
                email = %employee.email,
                "Onboarding process completed successfully for {}",
                employee.email
            );
        } else {
            let failed: Vec<&str> = outcome.failures().map(|(kind, _)| kind.as_str()).collect();
            warn!(
                email = %employee.email,
                failed_providers = ?failed,
                "Onboarding process completed for {} with some potential failures. Check logs for details.",
                employee.email
            );
        }

        outcome
    }
}
