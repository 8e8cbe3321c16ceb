//! Services bundle passed into every admin operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::locale::{Catalog, Translator};
use crate::log::{AdminLog, Severity, TracingLog};
use crate::params::ParamCache;
use crate::remote::RemoteApi;
use crate::source_db::DatabaseFactory;
use crate::store::ConfigStore;

/// Default instance name of the host CMS itself.
pub const DEFAULT_HOST_INSTANCE: &str = "host";

/// Collaborators of the admin operations for one request.
#[derive(Clone)]
pub struct AdminContext {
    store: Arc<dyn ConfigStore>,
    params: ParamCache,
    databases: Arc<dyn DatabaseFactory>,
    remote: Arc<dyn RemoteApi>,
    text: Arc<dyn Translator>,
    log: Arc<dyn AdminLog>,
    plugins_dir: PathBuf,
    host_instance: String,
}

impl AdminContext {
    /// Create a context with English messages, `tracing` logging, and
    /// `./plugins` as the plugin directory.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        databases: Arc<dyn DatabaseFactory>,
        remote: Arc<dyn RemoteApi>,
    ) -> Self {
        Self {
            params: ParamCache::new(Arc::clone(&store)),
            store,
            databases,
            remote,
            text: Arc::new(Catalog::english()),
            log: Arc::new(TracingLog),
            plugins_dir: PathBuf::from("./plugins"),
            host_instance: DEFAULT_HOST_INSTANCE.to_string(),
        }
    }

    pub fn with_translator(mut self, text: Arc<dyn Translator>) -> Self {
        self.text = text;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn AdminLog>) -> Self {
        self.log = log;
        self
    }

    pub fn with_plugins_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugins_dir = dir.into();
        self
    }

    /// Set the instance whose `secret` param signs remote API pings.
    pub fn with_host_instance(mut self, name: impl Into<String>) -> Self {
        self.host_instance = name.into();
        self
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    pub fn params(&self) -> &ParamCache {
        &self.params
    }

    pub fn databases(&self) -> &dyn DatabaseFactory {
        self.databases.as_ref()
    }

    pub fn remote(&self) -> &dyn RemoteApi {
        self.remote.as_ref()
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn host_instance(&self) -> &str {
        &self.host_instance
    }

    /// Resolve a message key.
    pub fn text(&self, key: &str) -> String {
        self.text.text(key)
    }

    /// Emit an instance-tagged log entry.
    pub fn raise(&self, severity: Severity, message: &str, instance: &str) {
        self.log.raise(severity, message, Some(instance));
    }
}
