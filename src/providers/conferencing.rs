//! Conferencing provisioner
//!
//! Confirms the employee already has an active account on the conferencing
//! platform and, when a default group is configured, adds them to it.
//! Accounts themselves are created out-of-band (typically through SSO), so a
//! missing account is reported as a warning and still counts as success.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ConferencingConfig;
use crate::error::ProvisionError;
use crate::http;
use crate::models::{EmployeeRecord, ProviderKind};
use crate::providers::Provisioner;
use crate::token::ApiTokenIssuer;

const PAGE_SIZE: &str = "100";

/// Links employees to existing conferencing accounts
pub struct ConferencingProvisioner {
    http: Client,
    config: ConferencingConfig,
    issuer: ApiTokenIssuer,
}

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    users: Vec<ConferencingUser>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConferencingUser {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddMembers<'a> {
    members: Vec<Member<'a>>,
}

#[derive(Debug, Serialize)]
struct Member<'a> {
    email: &'a str,
}

/// What the lookup found for the employee
#[derive(Debug, PartialEq, Eq)]
enum AccountStatus {
    Found { group: Option<String> },
    NotFound,
}

impl ConferencingProvisioner {
    pub fn new(http: Client, config: ConferencingConfig) -> Self {
        let issuer = ApiTokenIssuer::new(
            config.api_key.expose().to_string(),
            config.api_secret.clone(),
            config.token_ttl(),
        );
        Self {
            http,
            config,
            issuer,
        }
    }

    async fn link_account(&self, employee: &EmployeeRecord) -> Result<AccountStatus, ProvisionError> {
        let token = self
            .issuer
            .issue()
            .map_err(|e| ProvisionError::auth(e.to_string()))?;

        if !self.user_exists(&token, &employee.email).await? {
            return Ok(AccountStatus::NotFound);
        }

        match self.config.default_group_id.as_deref() {
            Some(group_id) => {
                self.add_to_group(&token, group_id, &employee.email).await?;
                Ok(AccountStatus::Found {
                    group: Some(group_id.to_string()),
                })
            }
            None => Ok(AccountStatus::Found { group: None }),
        }
    }

    /// Walk the whole active-user listing looking for an exact email match
    ///
    /// A cursor that comes back a second time means the listing would never
    /// end, so it fails the lookup instead of looping.
    async fn user_exists(&self, token: &str, email: &str) -> Result<bool, ProvisionError> {
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let url = http::endpoint(&self.config.api_base, &["users"])?;
            let mut request = self
                .http
                .get(url)
                .bearer_auth(token)
                .query(&[("status", "active"), ("page_size", PAGE_SIZE)]);
            if let Some(next) = &page_token {
                request = request.query(&[("next_page_token", next.as_str())]);
            }

            let response = http::ensure_success(request.send().await?).await?;
            let page: UserPage = http::read_json(response).await?;

            if page
                .users
                .iter()
                .any(|user| user.email.as_deref() == Some(email))
            {
                debug!(email = %email, page = page_number, "Conferencing user found");
                return Ok(true);
            }

            let Some(next) = page.next_page_token.filter(|t| !t.is_empty()) else {
                debug!(email = %email, pages = page_number, "Conferencing user listing exhausted");
                return Ok(false);
            };
            if !seen_tokens.insert(next.clone()) {
                return Err(ProvisionError::decode(format!(
                    "user listing repeated page token '{}' after {} pages",
                    next, page_number
                )));
            }
            page_token = Some(next);
        }
    }

    async fn add_to_group(&self, token: &str, group_id: &str, email: &str) -> Result<(), ProvisionError> {
        let url = http::endpoint(&self.config.api_base, &["groups", group_id, "members"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&AddMembers {
                members: vec![Member { email }],
            })
            .send()
            .await?;
        http::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Provisioner for ConferencingProvisioner {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Conferencing
    }

    async fn provision(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        match self.link_account(employee).await {
            Ok(AccountStatus::Found { group: Some(group) }) => {
                info!(
                    email = %employee.email,
                    group_id = %group,
                    "Conferencing user {} already exists and was added to group {}",
                    employee.email,
                    group
                );
                Ok(())
            }
            Ok(AccountStatus::Found { group: None }) => {
                info!(
                    email = %employee.email,
                    "Conferencing user {} already exists",
                    employee.email
                );
                Ok(())
            }
            Ok(AccountStatus::NotFound) => {
                warn!(
                    email = %employee.email,
                    "Conferencing user {} not found. Account creation might be manual or via SSO.",
                    employee.email
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    email = %employee.email,
                    error_kind = err.kind_label(),
                    "Error interacting with conferencing API for {}: {}",
                    employee.email,
                    err
                );
                Err(err)
            }
        }
    }
}
