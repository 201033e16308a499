//! Employee record shared by every provider in a run

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secret::Secret;

/// Validation failures when building an [`EmployeeRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmployeeRecordError {
    #[error("invalid email address '{email}'")]
    InvalidEmail { email: String },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// The new hire being onboarded
///
/// Built once per run and only ever borrowed by providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Primary identifier across all providers
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Directory org unit path; falls back to the directory default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    /// Initial directory password; falls back to a generated placeholder when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
}

impl EmployeeRecord {
    /// Create a record, validating the email shape and name fields
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, EmployeeRecordError> {
        let email = email.into().trim().to_string();
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();

        if !is_valid_email(&email) {
            return Err(EmployeeRecordError::InvalidEmail { email });
        }
        if first_name.is_empty() {
            return Err(EmployeeRecordError::EmptyField {
                field: "first_name",
            });
        }
        if last_name.is_empty() {
            return Err(EmployeeRecordError::EmptyField { field: "last_name" });
        }

        Ok(Self {
            email,
            first_name,
            last_name,
            org_unit: None,
            password: None,
        })
    }

    pub fn with_org_unit(mut self, org_unit: impl Into<String>) -> Self {
        let org_unit = org_unit.into();
        self.org_unit = (!org_unit.trim().is_empty()).then_some(org_unit);
        self
    }

    pub fn with_password(mut self, password: Secret) -> Self {
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Org unit to place the account in
    pub fn org_unit_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.org_unit.as_deref().unwrap_or(default)
    }
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}
