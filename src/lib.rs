//! # Employee Onboarding
//!
//! Provisions a new hire across the organization's SaaS tools in a fixed
//! order (directory, conferencing, file share, chat) and reports whether every
//! step succeeded. Individual provider failures are logged and aggregated,
//! never fatal.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod secret;
pub mod telemetry;
pub mod token;
