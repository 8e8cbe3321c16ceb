//! Configuration store for integration instances.
//!
//! Every integration instance owns exactly one row in the
//! `integration_instance` table. All reads and writes of that row go through
//! [`ConfigStore`] so tests and alternative hosts can swap the backend.

mod pg;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use pg::PgConfigStore;

use crate::params::Params;

/// Instance has never passed validation.
pub const STATUS_UNCONFIGURED: i16 = 0;

/// Instance passed validation.
pub const STATUS_CONFIGURED: i16 = 1;

/// Instance failed its last validation.
pub const STATUS_ERROR: i16 = 2;

/// A row from the `integration_instance` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PluginRecord {
    /// Instance name (unique key).
    pub name: String,

    /// Plugin kind; names the plugin directory.
    pub plugin: String,

    pub status: i16,

    /// Instance is a registration source in dual login.
    pub master: bool,

    /// Instance is a registration sink in dual login.
    pub slave: bool,

    /// Serialized parameters (JSON object, or empty).
    pub params: String,
}

impl PluginRecord {
    /// Parse the stored parameters.
    pub fn params(&self) -> Params {
        Params::parse(&self.params)
    }
}

/// Access to the shared instance table.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Check that the store's database answers.
    async fn ping(&self) -> Result<()>;

    /// Load one instance row by name.
    async fn load(&self, name: &str) -> Result<Option<PluginRecord>>;

    /// List all instance rows ordered by name.
    async fn list(&self) -> Result<Vec<PluginRecord>>;

    /// Write the serialized params of an instance.
    ///
    /// Returns `false` when no row matched `name`.
    async fn update_params(&self, name: &str, params: &str) -> Result<bool>;

    /// Write the status code of an instance.
    ///
    /// Returns `false` when no row matched `name`.
    async fn update_status(&self, name: &str, status: i16) -> Result<bool>;

    /// Create an unconfigured instance row, leaving an existing row untouched.
    ///
    /// Returns `true` if a row was created.
    async fn register(&self, name: &str, plugin: &str) -> Result<bool>;

    /// Load only the serialized params of an instance.
    async fn load_params(&self, name: &str) -> Result<Option<String>> {
        Ok(self.load(name).await?.map(|record| record.params))
    }
}
