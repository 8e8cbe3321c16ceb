//! Configuration validation.

use tracing::debug;

use super::IntegrationAdmin;
use crate::context::AdminContext;
use crate::error::ConfigError;
use crate::locale::keys;
use crate::params::Params;
use crate::source_db::SourceDatabase;

/// Files every plugin directory must contain.
pub const REQUIRED_FILES: [&str; 2] = ["admin.wasm", "user.wasm"];

/// Summary of a successful validation. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    /// Always 1 for a valid configuration.
    pub config: i16,
    pub message: String,
}

/// Check that an instance is usable.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. the integrated software's database opens and answers
/// 2. the host database answers
/// 3. the plugin directory holds every file in [`REQUIRED_FILES`]
/// 4. the remote API of the configured cookie domain answers a ping
/// 5. `source_path` is not a URL
/// 6. the user table exists, matched exactly or lower-cased
///
/// Operators rely on this precedence when reading the error, so the order
/// must not change.
pub async fn check_config(
    ctx: &AdminContext,
    admin: &dyn IntegrationAdmin,
) -> Result<ConfigReport, ConfigError> {
    let name = admin.instance().name.as_str();

    let database_unavailable = |detail: Option<String>| ConfigError::DatabaseUnavailable {
        label: ctx.text(keys::NO_DATABASE),
        detail,
    };

    let params = ctx
        .params()
        .get(name)
        .await
        .map_err(|e| database_unavailable(Some(format!("{e:#}"))))?;

    let db = ctx
        .databases()
        .open(name, &params)
        .await
        .map_err(|e| database_unavailable(Some(format!("{e:#}"))))?;

    let result = check_opened(ctx, admin, &params, db.as_ref()).await;
    db.close().await;
    result
}

/// Checks that run once the integrated database is open.
async fn check_opened(
    ctx: &AdminContext,
    admin: &dyn IntegrationAdmin,
    params: &Params,
    db: &dyn SourceDatabase,
) -> Result<ConfigReport, ConfigError> {
    let instance = admin.instance();
    let name = instance.name.as_str();

    db.ping().await.map_err(|e| ConfigError::DatabaseUnavailable {
        label: ctx.text(keys::NO_DATABASE),
        detail: Some(format!("{e:#}")),
    })?;

    ctx.store()
        .ping()
        .await
        .map_err(|e| ConfigError::HostDatabaseUnavailable {
            instance: name.to_string(),
            label: ctx.text(keys::NO_DATABASE),
            detail: Some(format!("{e:#}")),
        })?;

    let plugin_dir = ctx.plugins_dir().join(&instance.plugin);
    for file in REQUIRED_FILES {
        if !plugin_dir.join(file).exists() {
            return Err(ConfigError::MissingFile {
                label: ctx.text(keys::NO_FILES),
                file: file.to_string(),
            });
        }
    }

    if let Some(cookie_domain) = params.get_non_empty("cookie_domain") {
        if let Some(url) = ctx.remote().api_url(&cookie_domain) {
            let secret = match ctx.params().get(ctx.host_instance()).await {
                Ok(host_params) => host_params.get_str("secret").unwrap_or_default(),
                Err(e) => {
                    debug!(error = %e, "host params unavailable, pinging without secret");
                    String::new()
                }
            };

            ctx.remote().ping(&url, &secret).await.map_err(|failure| {
                ConfigError::RemoteApiUnreachable {
                    url: url.clone(),
                    message: failure.message,
                }
            })?;
        }
    }

    if let Some(source_path) = params
        .get_non_empty("source_path")
        .filter(|path| path.starts_with("http://") || path.starts_with("https://"))
    {
        return Err(ConfigError::InvalidSourcePath {
            label: ctx.text(keys::ERROR_SOURCE_PATH),
            path: source_path,
        });
    }

    let table = format!("{}{}", db.table_prefix(), admin.table_name());
    let missing_table = || ConfigError::MissingTable {
        label: ctx.text(keys::NO_TABLE),
        table: table.clone(),
    };

    let tables = db.table_list().await.map_err(|_| missing_table())?;
    if !tables.iter().any(|t| *t == table) {
        // Some database hosts lower-case table names on disk.
        let lowered = table.to_lowercase();
        if !tables.iter().any(|t| *t == lowered) {
            return Err(missing_table());
        }
    }

    debug!(instance = %name, table = %table, "configuration valid");

    Ok(ConfigReport {
        config: 1,
        message: ctx.text(keys::GOOD_CONFIG),
    })
}
