//! Provisioner trait definition
//!
//! Defines the interface every provider adapter implements.

use async_trait::async_trait;

use crate::error::ProvisionError;
use crate::models::{EmployeeRecord, ProviderKind};

/// One external system that takes part in onboarding
///
/// Implementations own their logging: exactly one `info` entry when the call
/// succeeds and exactly one `error` entry, carrying the employee's email, when
/// it fails. The error is returned rather than swallowed so the caller can
/// aggregate outcomes; it is never fatal.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Which provider this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Provision `employee` in the external system
    async fn provision(&self, employee: &EmployeeRecord) -> Result<(), ProvisionError>;
}
