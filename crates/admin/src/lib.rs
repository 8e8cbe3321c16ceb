//! Userbridge integration admin
//!
//! The admin contract implemented by every integration plugin, the
//! operations that drive it (validation, diagnostics, parameter persistence,
//! status reporting), and the collaborators those operations consume.
//! The `userbridge` binary wraps the operations in an operator CLI.

pub mod admin;
pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod locale;
pub mod log;
pub mod params;
pub mod remote;
pub mod source_db;
pub mod store;

pub use admin::{
    DefaultAdmin, IntegrationAdmin, PluginInstance, check_config, debug_config, save_parameters,
    update_status,
};
pub use context::AdminContext;
pub use error::ConfigError;
pub use params::{ParamCache, Params};
