//! Provider adapters
//!
//! This module provides:
//! - The `Provisioner` trait implemented by every adapter
//! - One adapter per external system, each a thin mapping from an
//!   [`EmployeeRecord`](crate::models::EmployeeRecord) to that vendor's API

pub mod chat;
pub mod conferencing;
pub mod directory;
pub mod file_share;
pub mod trait_;

pub use chat::ChatNotifier;
pub use conferencing::ConferencingProvisioner;
pub use directory::DirectoryProvisioner;
pub use file_share::FileShareProvisioner;
pub use trait_::Provisioner;
