//! # Data Models
//!
//! Records passed through a single onboarding run. Nothing here is persisted.

pub mod employee;
pub mod outcome;
pub mod provider;

pub use employee::{EmployeeRecord, EmployeeRecordError};
pub use outcome::OutcomeRecord;
pub use provider::ProviderKind;
