//! CLI command implementations for integration instances.
//!
//! Commands load the instance row, build a [`GenericAdmin`] from its params
//! and run the corresponding admin operation.

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::admin::{
    GenericAdmin, PluginInstance, check_config, debug_config, save_parameters, update_status,
};
use crate::context::AdminContext;
use crate::params::Params;
use crate::store::{STATUS_CONFIGURED, STATUS_ERROR, STATUS_UNCONFIGURED};

/// Load an instance and build its admin.
async fn load_admin(ctx: &AdminContext, name: &str) -> Result<GenericAdmin> {
    let record = ctx
        .store()
        .load(name)
        .await?
        .with_context(|| format!("integration instance '{name}' not found"))?;

    let instance = PluginInstance::new(record.name.clone(), record.plugin.clone());
    Ok(GenericAdmin::from_params(instance, &record.params()))
}

fn status_label(status: i16) -> &'static str {
    match status {
        STATUS_UNCONFIGURED => "unconfigured",
        STATUS_CONFIGURED => "configured",
        STATUS_ERROR => "error",
        _ => "unknown",
    }
}

/// Parse `KEY=VALUE` arguments into params.
///
/// `true`/`false` become booleans; everything else stays a string.
pub fn parse_assignments(pairs: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("'{pair}' must look like KEY=VALUE");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("'{pair}' has an empty key");
        }
        let value = match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        };
        params.set(key, value);
    }
    Ok(params)
}

/// List all integration instances.
pub async fn cmd_list(ctx: &AdminContext) -> Result<()> {
    let records = ctx.store().list().await?;
    if records.is_empty() {
        println!("No integration instances found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<16} {:<14} {:<8} {:<8}",
        "INSTANCE", "PLUGIN", "STATUS", "MASTER", "SLAVE"
    );
    println!("{}", "-".repeat(70));

    for record in &records {
        println!(
            "{:<20} {:<16} {:<14} {:<8} {:<8}",
            record.name,
            record.plugin,
            status_label(record.status),
            if record.master { "yes" } else { "no" },
            if record.slave { "yes" } else { "no" },
        );
    }

    Ok(())
}

/// Create an unconfigured instance of `plugin`.
pub async fn cmd_register(ctx: &AdminContext, name: &str, plugin: &str) -> Result<()> {
    let name = name.trim();
    let plugin = plugin.trim();
    if name.is_empty() || plugin.is_empty() {
        bail!("instance and plugin names must not be empty");
    }

    if !ctx.store().register(name, plugin).await? {
        bail!("integration instance '{name}' already exists");
    }

    println!("Registered '{name}' ({plugin}).");
    Ok(())
}

/// Validate an instance and record the outcome as its status.
pub async fn cmd_check(ctx: &AdminContext, name: &str) -> Result<()> {
    let admin = load_admin(ctx, name).await?;

    match check_config(ctx, &admin).await {
        Ok(report) => {
            update_status(ctx, &admin, STATUS_CONFIGURED).await;
            println!("{name}: {}", report.message);
            Ok(())
        }
        Err(e) => {
            update_status(ctx, &admin, STATUS_ERROR).await;
            bail!("{name}: {e} [{}]", e.kind());
        }
    }
}

/// Run advisory diagnostics for an instance.
pub async fn cmd_debug(ctx: &AdminContext, name: &str, server_name: &str) -> Result<()> {
    let admin = load_admin(ctx, name).await?;
    debug_config(ctx, &admin, server_name).await;
    println!("Diagnostics for '{name}' written to the log.");
    Ok(())
}

/// Save `KEY=VALUE` params for an instance.
pub async fn cmd_save(ctx: &AdminContext, name: &str, pairs: &[String], wizard: bool) -> Result<()> {
    let post = parse_assignments(pairs)?;
    let admin = load_admin(ctx, name).await?;

    if !save_parameters(ctx, &admin, post, wizard).await {
        bail!("failed to save params for '{name}', see the log for details");
    }

    println!("Params for '{name}' saved.");
    Ok(())
}

/// Set the status code of an instance.
pub async fn cmd_status(ctx: &AdminContext, name: &str, status: i16) -> Result<()> {
    let admin = load_admin(ctx, name).await?;
    update_status(ctx, &admin, status).await;
    println!("Status of '{name}' set to {status} ({}).", status_label(status));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_assignments_types_values() {
        let params = parse_assignments(&[
            "source_url=example.com".to_string(),
            "debug=true".to_string(),
            "query=a=b".to_string(),
        ])
        .unwrap();

        assert_eq!(params.get("debug"), Some(&Value::Bool(true)));
        assert_eq!(params.get_str("source_url").as_deref(), Some("example.com"));
        assert_eq!(params.get_str("query").as_deref(), Some("a=b"));
    }

    #[test]
    fn parse_assignments_rejects_missing_equals() {
        assert!(parse_assignments(&["source_url".to_string()]).is_err());
        assert!(parse_assignments(&["=value".to_string()]).is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label(STATUS_CONFIGURED), "configured");
        assert_eq!(status_label(42), "unknown");
    }
}
