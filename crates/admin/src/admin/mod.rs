//! The admin contract every integration plugin implements.
//!
//! [`IntegrationAdmin`] describes the full capability set with permissive
//! defaults; an integration overrides only what its software does
//! differently. [`DefaultAdmin`] is the plain base implementation.
//!
//! The operations that drive the contract are free functions taking an
//! [`AdminContext`]:
//!
//! - [`check_config`] validates an instance and fails on the first problem
//! - [`debug_config`] logs advisory notices about likely misconfiguration
//! - [`save_parameters`] normalizes and persists submitted parameters
//! - [`update_status`] records the instance status code

mod diagnose;
mod generic;
mod persist;
mod status;
mod validate;

use std::fmt;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use diagnose::{canonical_cookie_domain, debug_config};
pub use generic::GenericAdmin;
pub use persist::{normalize_source_path, normalize_source_url, save_parameters};
pub use status::update_status;
pub use validate::{ConfigReport, REQUIRED_FILES, check_config};

use crate::context::AdminContext;
use crate::params::Params;

/// Identity of one integration instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginInstance {
    /// Instance name (unique key in the config store).
    pub name: String,

    /// Plugin kind; names the directory under the plugins dir.
    pub plugin: String,
}

impl PluginInstance {
    pub fn new(name: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
        }
    }
}

impl fmt::Display for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.plugin)
    }
}

/// A user as listed by the integrated software.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub userid: String,
    pub username: String,
    pub email: Option<String>,
}

/// A usergroup of the integrated software.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usergroup {
    pub id: String,
    pub name: String,
}

/// Whether the integrated software needs local file access to work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAccess {
    #[default]
    Unknown,
    Yes,
    No,
}

/// Admin capabilities of an integration plugin.
#[async_trait]
pub trait IntegrationAdmin: Send + Sync {
    /// The instance this admin operates on.
    fn instance(&self) -> &PluginInstance;

    /// Users of the integrated software, `limit = 0` meaning no limit.
    async fn user_list(&self, _offset: usize, _limit: usize) -> Result<Vec<UserSummary>> {
        Ok(Vec::new())
    }

    /// Number of users, used to size user synchronization.
    async fn user_count(&self) -> Result<u64> {
        Ok(0)
    }

    async fn usergroup_list(&self) -> Result<Vec<Usergroup>> {
        Ok(Vec::new())
    }

    /// Names of the usergroups configured as default for new users.
    ///
    /// Reads the `default_usergroups` param (ids) and resolves them against
    /// [`usergroup_list`](Self::usergroup_list).
    async fn default_usergroups(&self, ctx: &AdminContext) -> Result<Vec<String>> {
        let params = ctx.params().get(&self.instance().name).await?;
        let ids = params.get_list("default_usergroups");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let groups = self.usergroup_list().await?;
        Ok(groups
            .into_iter()
            .filter(|group| ids.contains(&group.id))
            .map(|group| group.name)
            .collect())
    }

    /// Whether the integrated software accepts new registrations.
    async fn allow_registration(&self) -> bool {
        true
    }

    /// Name of the user table, without the table prefix.
    fn table_name(&self) -> String {
        String::new()
    }

    /// Derive params from an installation of the integrated software.
    fn setup_from_path(&self, _path: &Path) -> Result<Params> {
        Ok(Params::new())
    }

    fn allow_empty_cookie_path(&self) -> bool {
        false
    }

    fn allow_empty_cookie_domain(&self) -> bool {
        false
    }

    /// Plugin-specific diagnostics, run last by [`debug_config`].
    async fn debug_config_extra(&self, _ctx: &AdminContext) {}

    /// Undo plugin-side installation work. `Err` carries the reason.
    async fn uninstall(&self) -> Result<(), String> {
        Ok(())
    }

    fn is_multi_group(&self) -> bool {
        false
    }

    fn require_file_access(&self) -> FileAccess {
        FileAccess::Unknown
    }

    /// Whether several instances of this plugin may be configured.
    fn multi_instance(&self) -> bool {
        true
    }

    /// Read a config file of the integrated software line by line.
    fn read_file(&self, path: &Path) -> Option<Vec<String>> {
        let content = std::fs::read_to_string(path).ok()?;
        Some(content.lines().map(String::from).collect())
    }

    /// Script snippet registering the admin renderer for this instance.
    fn render_group(&self) -> String {
        format!(
            "UserBridge.renderPlugin['{}'] = UserBridge.renderDefault;",
            self.instance().name
        )
    }
}

/// Base admin with every default behavior.
#[derive(Debug, Clone)]
pub struct DefaultAdmin {
    instance: PluginInstance,
}

impl DefaultAdmin {
    pub fn new(instance: PluginInstance) -> Self {
        Self { instance }
    }
}

#[async_trait]
impl IntegrationAdmin for DefaultAdmin {
    fn instance(&self) -> &PluginInstance {
        &self.instance
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn render_group_names_instance() {
        let admin = DefaultAdmin::new(PluginInstance::new("forum", "phpbb"));
        assert_eq!(
            admin.render_group(),
            "UserBridge.renderPlugin['forum'] = UserBridge.renderDefault;"
        );
    }

    #[test]
    fn default_capabilities() {
        let admin = DefaultAdmin::new(PluginInstance::new("forum", "phpbb"));
        assert_eq!(admin.table_name(), "");
        assert!(admin.multi_instance());
        assert!(!admin.is_multi_group());
        assert!(!admin.allow_empty_cookie_domain());
        assert!(!admin.allow_empty_cookie_path());
        assert_eq!(admin.require_file_access(), FileAccess::Unknown);
        assert!(admin.setup_from_path(Path::new("/srv/forum")).unwrap().is_empty());
    }

    #[test]
    fn read_file_returns_lines() {
        let admin = DefaultAdmin::new(PluginInstance::new("forum", "phpbb"));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "$dbhost = 'localhost';").unwrap();
        writeln!(file, "$dbname = 'forum';").unwrap();

        let lines = admin.read_file(file.path()).unwrap();
        assert_eq!(lines, vec!["$dbhost = 'localhost';", "$dbname = 'forum';"]);
        assert!(admin.read_file(Path::new("/nonexistent/config.php")).is_none());
    }

    #[test]
    fn instance_display() {
        let instance = PluginInstance::new("forum", "phpbb");
        assert_eq!(instance.to_string(), "forum (phpbb)");
    }
}
