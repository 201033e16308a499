//! Directory provisioner
//!
//! Creates the employee's account through the Google Workspace Admin
//! Directory API and adds it to the onboarding group.
//!
//! ## Authentication
//!
//! Every run reads the service-account key file, signs an RS256 assertion for
//! the configured admin scopes and exchanges it at the key's token endpoint
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer`) for a bearer token. Nothing
//! is cached between runs.
//!
//! ## Requests
//!
//! - `POST /admin/directory/v1/users?domain={domain}` creates the account with
//!   `changePasswordAtNextLogin` set
//! - `POST /admin/directory/v1/groups/{group}/members` adds it to the group
//!
//! Neither call is idempotent; running twice for the same email fails with a
//! conflict from the directory.

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::DirectoryConfig;
use crate::error::ProvisionError;
use crate::http;
use crate::models::{EmployeeRecord, ProviderKind};
use crate::providers::Provisioner;
use crate::secret::Secret;
use crate::token::ServiceAccountKey;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const MEMBER_ROLE: &str = "MEMBER";
const TEMP_PASSWORD_LEN: usize = 16;

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_";

/// Creates directory accounts and group memberships
pub struct DirectoryProvisioner {
    http: Client,
    config: DirectoryConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUser<'a> {
    primary_email: &'a str,
    name: UserName<'a>,
    password: &'a str,
    org_unit_path: &'a str,
    change_password_at_next_login: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserName<'a> {
    given_name: &'a str,
    family_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedUser {
    primary_email: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct GroupMember<'a> {
    email: &'a str,
    role: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl DirectoryProvisioner {
    pub fn new(http: Client, config: DirectoryConfig) -> Self {
        Self { http, config }
    }

    async fn create_account(&self, employee: &EmployeeRecord) -> Result<CreatedUser, ProvisionError> {
        let token = self.access_token().await?;
        let created = self.insert_user(&token, employee).await?;
        self.add_to_group(&token, &created.primary_email).await?;
        Ok(created)
    }

    /// Exchange a signed service-account assertion for a bearer token
    async fn access_token(&self) -> Result<Secret, ProvisionError> {
        let key = ServiceAccountKey::from_file(&self.config.service_account_file)
            .map_err(|e| ProvisionError::auth(e.to_string()))?;
        let token_uri = self
            .config
            .token_uri
            .clone()
            .unwrap_or_else(|| key.token_uri.clone());

        let assertion = key
            .assertion(
                &self.config.admin_scopes,
                self.config.admin_subject.as_deref(),
                &token_uri,
                Utc::now(),
            )
            .map_err(|e| ProvisionError::auth(e.to_string()))?;

        let response = self
            .http
            .post(&token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::auth(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: AccessTokenResponse = http::read_json(response)
            .await
            .map_err(|e| ProvisionError::auth(format!("unusable token response: {}", e)))?;

        debug!(
            client_email = %key.client_email,
            expires_in = ?token.expires_in,
            "Obtained directory access token"
        );
        Ok(Secret::new(token.access_token))
    }

    async fn insert_user(
        &self,
        token: &Secret,
        employee: &EmployeeRecord,
    ) -> Result<CreatedUser, ProvisionError> {
        let password = employee
            .password
            .as_ref()
            .or(self.config.default_password.as_ref())
            .cloned()
            .unwrap_or_else(generate_temporary_password);
        let org_unit = employee.org_unit_or(&self.config.default_org_unit);

        let body = NewUser {
            primary_email: &employee.email,
            name: UserName {
                given_name: &employee.first_name,
                family_name: &employee.last_name,
            },
            password: password.expose(),
            org_unit_path: org_unit,
            change_password_at_next_login: true,
        };

        let url = http::endpoint(&self.config.api_base, &["admin", "directory", "v1", "users"])?;
        let response = self
            .http
            .post(url)
            .query(&[("domain", self.config.domain.as_str())])
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        let created: CreatedUser = http::read_json(http::ensure_success(response).await?).await?;
        debug!(
            email = %created.primary_email,
            user_id = ?created.id,
            org_unit = %org_unit,
            "Directory user created"
        );
        Ok(created)
    }

    async fn add_to_group(&self, token: &Secret, email: &str) -> Result<(), ProvisionError> {
        let group = self.config.onboarding_group.as_str();
        let url = http::endpoint(
            &self.config.api_base,
            &["admin", "directory", "v1", "groups", group, "members"],
        )?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose())
            .json(&GroupMember {
                email,
                role: MEMBER_ROLE,
            })
            .send()
            .await?;
        http::ensure_success(response).await?;

        debug!(email = %email, group = %group, "Directory user added to group");
        Ok(())
    }
}

#[async_trait]
impl Provisioner for DirectoryProvisioner {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Directory
    }

    async fn provision(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        match self.create_account(employee).await {
            Ok(created) => {
                info!(
                    email = %employee.email,
                    user_id = ?created.id,
                    group = %self.config.onboarding_group,
                    "Directory user {} created and added to group {}",
                    created.primary_email,
                    self.config.onboarding_group
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    email = %employee.email,
                    error_kind = err.kind_label(),
                    "Error during directory onboarding for {}: {}",
                    employee.email,
                    err
                );
                Err(err)
            }
        }
    }
}

/// Random initial password with at least one character from each class
fn generate_temporary_password() -> Secret {
    let mut rng = rand::thread_rng();
    let classes: [&[u8]; 4] = [UPPER, LOWER, DIGITS, SYMBOLS];
    let alphabet = classes.concat();

    let mut chars: Vec<u8> = classes
        .iter()
        .filter_map(|class| class.choose(&mut rng).copied())
        .collect();
    while chars.len() < TEMP_PASSWORD_LEN {
        if let Some(c) = alphabet.choose(&mut rng) {
            chars.push(*c);
        }
    }
    chars.shuffle(&mut rng);

    Secret::new(chars.into_iter().map(char::from).collect::<String>())
}
