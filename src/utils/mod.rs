//! Utilities Module
//!
//! Logging and configuration shared by the library and the CLI.

pub mod logging;
pub mod service_config;

pub use service_config::{ConfigValidation, MailConfig, ServiceConfig};
