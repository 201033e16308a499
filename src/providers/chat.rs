//! Chat notifier
//!
//! Posts a welcome announcement for the new hire to the configured channel
//! via `chat.postMessage`. The chat API answers HTTP 200 even for logical
//! failures, so success also requires `"ok": true` in the body; otherwise the
//! accompanying `error` code is logged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ChatConfig;
use crate::error::ProvisionError;
use crate::http;
use crate::models::{EmployeeRecord, ProviderKind};
use crate::providers::Provisioner;

/// Announces new hires in a chat channel
pub struct ChatNotifier {
    http: Client,
    config: ChatConfig,
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Welcome text with a mailto mention of the new hire
pub fn welcome_message(employee: &EmployeeRecord) -> String {
    format!(
        "Welcome to the team, <mailto:{}|{}>! Please introduce yourself in this channel.",
        employee.email,
        employee.full_name()
    )
}

/// Non-2xx reply; keeps the API `error` code when the body still carries one
fn rejection_from_error_body(status: u16, body: Option<String>) -> ProvisionError {
    let code = body
        .as_deref()
        .and_then(|body| serde_json::from_str::<PostMessageResponse>(body).ok())
        .and_then(|ack| ack.error);
    match code {
        Some(code) => ProvisionError::RemoteRejection {
            status,
            code: Some(code),
            body,
        },
        None => ProvisionError::http_status(status, body),
    }
}

impl ChatNotifier {
    pub fn new(http: Client, config: ChatConfig) -> Self {
        Self { http, config }
    }

    async fn post_welcome(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        let text = welcome_message(employee);
        let url = http::endpoint(&self.config.api_base, &["chat.postMessage"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.config.bot_token.expose())
            .json(&PostMessage {
                channel: &self.config.channel,
                text: &text,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(rejection_from_error_body(status, response.text().await.ok()));
        }
        let ack: PostMessageResponse = http::read_json(response).await?;

        if !ack.ok {
            return Err(ProvisionError::rejected(status, ack.error));
        }
        Ok(())
    }

    fn log_failure(&self, employee: &EmployeeRecord, err: &ProvisionError) {
        match err {
            ProvisionError::RemoteRejection {
                code: Some(code), ..
            } => error!(
                email = %employee.email,
                channel = %self.config.channel,
                error_code = %code,
                "Failed to send welcome message to chat for {}: {}",
                employee.email,
                code
            ),
            ProvisionError::Decode { .. } => error!(
                email = %employee.email,
                error_kind = err.kind_label(),
                "Error decoding chat response for {}: {}",
                employee.email,
                err
            ),
            _ => error!(
                email = %employee.email,
                error_kind = err.kind_label(),
                "Error sending message to chat for {}: {}",
                employee.email,
                err
            ),
        }
    }
}

#[async_trait]
impl Provisioner for ChatNotifier {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Chat
    }

    async fn provision(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError> {
        match self.post_welcome(employee).await {
            Ok(()) => {
                info!(
                    email = %employee.email,
                    channel = %self.config.channel,
                    "Welcome message sent to {} for {}",
                    self.config.channel,
                    employee.email
                );
                Ok(())
            }
            Err(err) => {
                self.log_failure(employee, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_message_mentions_employee() {
        let employee = EmployeeRecord::new("newhire123@corp.com", "John", "Doe").unwrap();
        assert_eq!(
            welcome_message(&employee),
            "Welcome to the team, <mailto:newhire123@corp.com|John Doe>! Please introduce yourself in this channel."
        );
    }

    #[test]
    fn missing_ok_field_is_treated_as_rejection() {
        let ack: PostMessageResponse = serde_json::from_str(r#"{"error":"invalid_auth"}"#).unwrap();
        assert!(!ack.ok);
        assert_eq!(ack.error.as_deref(), Some("invalid_auth"));
    }
}
