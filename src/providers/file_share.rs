//! File share provisioner
//!
//! Invites the employee's email to the configured shared folder with a single
//! `sharing/add_folder_member` call. Transport/status failures and an
//! unreadable response body are logged under different messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::FileShareConfig;
use crate::error::ProvisionError;
use crate::http;
use crate::models::{EmployeeRecord, ProviderKind};
use crate::providers::Provisioner;

/// Grants shared-folder access
pub struct FileShareProvisioner {
    http: Client,
    config: FileShareConfig,
}

#[derive(Debug, Serialize)]
struct AddFolderMember<'a> {
    share_path: &'a str,
    members: Vec<FolderMember<'a>>,
}

#[derive(Debug, Serialize)]
struct FolderMember<'a> {
    member: MemberSelector<'a>,
    access_level: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
enum MemberSelector<'a> {
    Email { email: &'a str },
}

impl FileShareProvisioner {
    pub fn new(http: Client, config: FileShareConfig) -> Self {
        Self { http, config }
    }

    async fn add_folder_member(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        let body = AddFolderMember {
            share_path: &self.config.folder_path,
            members: vec![FolderMember {
                member: MemberSelector::Email {
                    email: &employee.email,
                },
                access_level: &self.config.access_level,
            }],
        };

        let url = http::endpoint(&self.config.api_base, &["sharing", "add_folder_member"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.access_token.expose())
            .json(&body)
            .send()
            .await?;

        // A successful call answers with JSON `null`; anything unparseable is a decode failure.
        let _: serde_json::Value = http::read_json(http::ensure_success(response).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl Provisioner for FileShareProvisioner {
    fn kind(&self) -> ProviderKind {
        ProviderKind::FileShare
    }

    async fn provision(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        let result = self.add_folder_member(employee).await;
        match &result {
            Ok(()) => info!(
                email = %employee.email,
                folder = %self.config.folder_path,
                access_level = %self.config.access_level,
                "Invited {} to shared folder: {}",
                employee.email,
                self.config.folder_path
            ),
            Err(err) if matches!(err, ProvisionError::Decode { .. }) => error!(
                email = %employee.email,
                error_kind = err.kind_label(),
                "Error decoding file share response for {}: {}",
                employee.email,
                err
            ),
            Err(err) => error!(
                email = %employee.email,
                error_kind = err.kind_label(),
                "Error inviting {} to shared folder: {}",
                employee.email,
                err
            ),
        }
        result
    }
}
