//! PostgreSQL implementation of [`ConfigStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::{ConfigStore, PluginRecord};

/// Config store over the host CMS database.
#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("host database is not reachable")?;
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<PluginRecord>> {
        let record = sqlx::query_as::<_, PluginRecord>(
            "SELECT name, plugin, status, master, slave, params \
             FROM integration_instance WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load integration instance")?;

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<PluginRecord>> {
        let records = sqlx::query_as::<_, PluginRecord>(
            "SELECT name, plugin, status, master, slave, params \
             FROM integration_instance ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list integration instances")?;

        Ok(records)
    }

    async fn update_params(&self, name: &str, params: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE integration_instance SET params = $1 WHERE name = $2")
            .bind(params)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("failed to save integration params")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status(&self, name: &str, status: i16) -> Result<bool> {
        let result = sqlx::query("UPDATE integration_instance SET status = $1 WHERE name = $2")
            .bind(status)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("failed to save integration status")?;

        Ok(result.rows_affected() > 0)
    }

    async fn register(&self, name: &str, plugin: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO integration_instance (name, plugin) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(plugin)
        .execute(&self.pool)
        .await
        .context("failed to register integration instance")?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_params(&self, name: &str) -> Result<Option<String>> {
        let params = sqlx::query_scalar::<_, String>(
            "SELECT params FROM integration_instance WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load integration params")?;

        Ok(params)
    }
}
