//! Service Configuration Module
//!
//! Server, model, data and path settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `ONCO_CONFIG` environment variable (path to TOML file)
//! 2. `service_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded `ServiceConfig` is passed explicitly to the service and the
//! router; there is no global instance.

mod service_config;
pub mod defaults;

pub use service_config::*;
