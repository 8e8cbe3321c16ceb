//! Database of the integrated software.
//!
//! Each instance points at the database of the software it integrates
//! (forum, shop, wiki...). Validation only needs liveness, the table list and
//! the table prefix, so that is all [`SourceDatabase`] exposes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::debug;

use crate::params::Params;

/// Default PostgreSQL port when `database_port` is unset.
const DEFAULT_PORT: u16 = 5432;

/// Connection to the integrated software's database.
#[async_trait]
pub trait SourceDatabase: Send + Sync {
    /// Check that the database answers.
    async fn ping(&self) -> Result<()>;

    /// Names of all tables visible to the connection.
    async fn table_list(&self) -> Result<Vec<String>>;

    /// Prefix the integrated software puts in front of its table names.
    fn table_prefix(&self) -> &str;

    /// Release the connection. Called once validation is done with it.
    async fn close(&self);
}

/// Opens the integrated software database for an instance.
#[async_trait]
pub trait DatabaseFactory: Send + Sync {
    async fn open(&self, instance: &str, params: &Params) -> Result<Arc<dyn SourceDatabase>>;
}

/// [`SourceDatabase`] over a PostgreSQL pool.
pub struct PgSourceDatabase {
    pool: PgPool,
    prefix: String,
}

impl PgSourceDatabase {
    pub fn new(pool: PgPool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl SourceDatabase for PgSourceDatabase {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("integrated database is not reachable")?;
        Ok(())
    }

    async fn table_list(&self) -> Result<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list tables")?;

        Ok(tables)
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens PostgreSQL pools from the `database_*` params of an instance.
///
/// Recognized params: `database_host` (required), `database_port`,
/// `database_name`, `database_user`, `database_password`, `database_prefix`.
#[derive(Debug, Clone)]
pub struct PgDatabaseFactory {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgDatabaseFactory {
    pub fn new(max_connections: u32, acquire_timeout: Duration) -> Self {
        Self {
            max_connections,
            acquire_timeout,
        }
    }
}

impl Default for PgDatabaseFactory {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(5))
    }
}

/// Build connect options from instance params.
fn connect_options(instance: &str, params: &Params) -> Result<PgConnectOptions> {
    let Some(host) = params.get_non_empty("database_host") else {
        bail!("instance '{instance}' has no database_host configured");
    };

    let port = match params.get_non_empty("database_port") {
        Some(port) => port
            .parse::<u16>()
            .with_context(|| format!("instance '{instance}': database_port must be a valid u16"))?,
        None => DEFAULT_PORT,
    };

    let mut options = PgConnectOptions::new().host(&host).port(port);
    if let Some(name) = params.get_non_empty("database_name") {
        options = options.database(&name);
    }
    if let Some(user) = params.get_non_empty("database_user") {
        options = options.username(&user);
    }
    if let Some(password) = params.get_non_empty("database_password") {
        options = options.password(&password);
    }

    Ok(options)
}

#[async_trait]
impl DatabaseFactory for PgDatabaseFactory {
    async fn open(&self, instance: &str, params: &Params) -> Result<Arc<dyn SourceDatabase>> {
        let options = connect_options(instance, params)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to the database of '{instance}'"))?;

        let prefix = params.get_str("database_prefix").unwrap_or_default();
        debug!(instance = %instance, prefix = %prefix, "integrated database opened");

        Ok(Arc::new(PgSourceDatabase::new(pool, prefix)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn connect_options_require_host() {
        let err = connect_options("forum", &Params::new()).unwrap_err();
        assert!(err.to_string().contains("database_host"));
    }

    #[test]
    fn connect_options_reject_bad_port() {
        let params: Params = [("database_host", "db"), ("database_port", "port")]
            .into_iter()
            .collect();
        let err = connect_options("forum", &params).unwrap_err();
        assert!(err.to_string().contains("database_port"));
    }

    #[test]
    fn connect_options_accept_full_params() {
        let params: Params = [
            ("database_host", "db.internal"),
            ("database_port", "6432"),
            ("database_name", "forum"),
            ("database_user", "forum"),
            ("database_password", "secret"),
        ]
        .into_iter()
        .collect();

        let options = connect_options("forum", &params).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_database(), Some("forum"));
    }
}
