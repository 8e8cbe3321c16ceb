#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Userbridge test utilities.
//!
//! In-memory stand-ins for every collaborator of the admin operations, plus
//! fixture builders. Each fake counts the calls tests care about and can be
//! switched into a failing mode.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use userbridge_admin::AdminContext;
use userbridge_admin::log::{AdminLog, Severity};
use userbridge_admin::params::Params;
use userbridge_admin::remote::{PingFailure, RemoteApi};
use userbridge_admin::source_db::{DatabaseFactory, SourceDatabase};
use userbridge_admin::store::{ConfigStore, PluginRecord};

/// Create a test instance record with empty params.
pub fn test_record(name: &str, plugin: &str) -> TestRecord {
    TestRecord {
        record: PluginRecord {
            name: name.to_string(),
            plugin: plugin.to_string(),
            ..PluginRecord::default()
        },
    }
}

/// A test record builder.
#[derive(Debug, Clone)]
pub struct TestRecord {
    record: PluginRecord,
}

impl TestRecord {
    /// Set stored params from a JSON value.
    pub fn with_params(mut self, params: JsonValue) -> Self {
        self.record.params = params.to_string();
        self
    }

    /// Set raw stored params text.
    pub fn with_raw_params(mut self, raw: &str) -> Self {
        self.record.params = raw.to_string();
        self
    }

    /// Mark as registration master.
    pub fn master(mut self) -> Self {
        self.record.master = true;
        self
    }

    /// Mark as registration slave.
    pub fn slave(mut self) -> Self {
        self.record.slave = true;
        self
    }

    pub fn with_status(mut self, status: i16) -> Self {
        self.record.status = status;
        self
    }

    pub fn build(self) -> PluginRecord {
        self.record
    }
}

/// In-memory [`ConfigStore`].
#[derive(Default)]
pub struct MemoryConfigStore {
    records: Mutex<BTreeMap<String, PluginRecord>>,
    fail_ping: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: PluginRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.name.clone(), record);
    }

    /// Current state of a record.
    pub fn record(&self, name: &str) -> Option<PluginRecord> {
        self.records.lock().unwrap().get(name).cloned()
    }

    /// Current stored params of a record, parsed.
    pub fn stored_params(&self, name: &str) -> Params {
        self.record(name)
            .map(|record| record.params())
            .unwrap_or_default()
    }

    pub fn set_fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("simulated read failure");
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure");
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn ping(&self) -> Result<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            bail!("host database went away");
        }
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<PluginRecord>> {
        self.check_read()?;
        Ok(self.record(name))
    }

    async fn list(&self) -> Result<Vec<PluginRecord>> {
        self.check_read()?;
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn update_params(&self, name: &str, params: &str) -> Result<bool> {
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(name) else {
            return Ok(false);
        };
        record.params = params.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn update_status(&self, name: &str, status: i16) -> Result<bool> {
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(name) else {
            return Ok(false);
        };
        record.status = status;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn register(&self, name: &str, plugin: &str) -> Result<bool> {
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        if records.contains_key(name) {
            return Ok(false);
        }
        records.insert(
            name.to_string(),
            PluginRecord {
                name: name.to_string(),
                plugin: plugin.to_string(),
                ..PluginRecord::default()
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// In-memory [`SourceDatabase`].
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Vec<String>,
    prefix: String,
    fail_ping: AtomicBool,
    fail_table_list: AtomicBool,
    table_list_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MemoryDatabase {
    pub fn new(prefix: &str, tables: &[&str]) -> Self {
        Self {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    pub fn set_fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_table_list(&self, fail: bool) {
        self.fail_table_list.store(fail, Ordering::SeqCst);
    }

    /// How often the table list was requested.
    pub fn table_list_calls(&self) -> usize {
        self.table_list_calls.load(Ordering::SeqCst)
    }

    /// How often the connection was closed.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceDatabase for MemoryDatabase {
    async fn ping(&self) -> Result<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        Ok(())
    }

    async fn table_list(&self) -> Result<Vec<String>> {
        self.table_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_table_list.load(Ordering::SeqCst) {
            bail!("permission denied for information_schema");
        }
        Ok(self.tables.clone())
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`DatabaseFactory`] handing out one shared [`MemoryDatabase`].
pub struct StaticDatabaseFactory {
    database: Arc<MemoryDatabase>,
    open_error: Mutex<Option<String>>,
}

impl StaticDatabaseFactory {
    pub fn new(database: Arc<MemoryDatabase>) -> Self {
        Self {
            database,
            open_error: Mutex::new(None),
        }
    }

    /// Make every `open` fail with `message`.
    pub fn fail_open(&self, message: &str) {
        *self.open_error.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl DatabaseFactory for StaticDatabaseFactory {
    async fn open(&self, instance: &str, _params: &Params) -> Result<Arc<dyn SourceDatabase>> {
        if let Some(message) = self.open_error.lock().unwrap().clone() {
            bail!("cannot open database of '{instance}': {message}");
        }
        let database: Arc<dyn SourceDatabase> = self.database.clone();
        Ok(database)
    }
}

/// Scripted [`RemoteApi`] recording every ping.
#[derive(Default)]
pub struct StubRemoteApi {
    endpoints: Mutex<HashMap<String, String>>,
    failure: Mutex<Option<String>>,
    pings: Mutex<Vec<(String, String)>>,
}

impl StubRemoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `url` for an exact cookie domain.
    pub fn add_endpoint(&self, cookie_domain: &str, url: &str) {
        self.endpoints
            .lock()
            .unwrap()
            .insert(cookie_domain.to_string(), url.to_string());
    }

    /// Make every ping fail with `message`.
    pub fn fail_pings(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// `(url, secret)` of every ping so far.
    pub fn pings(&self) -> Vec<(String, String)> {
        self.pings.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteApi for StubRemoteApi {
    fn api_url(&self, cookie_domain: &str) -> Option<String> {
        self.endpoints.lock().unwrap().get(cookie_domain).cloned()
    }

    async fn ping(&self, url: &str, secret: &str) -> Result<(), PingFailure> {
        self.pings
            .lock()
            .unwrap()
            .push((url.to_string(), secret.to_string()));
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(PingFailure::new(message)),
            None => Ok(()),
        }
    }
}

/// One captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub instance: Option<String>,
}

/// [`AdminLog`] that keeps every entry in memory.
#[derive(Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of entries at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    /// Messages logged at exactly `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl AdminLog for RecordingLog {
    fn raise(&self, severity: Severity, message: &str, instance: Option<&str>) {
        self.entries.lock().unwrap().push(LogEntry {
            severity,
            message: message.to_string(),
            instance: instance.map(String::from),
        });
    }
}

/// A complete set of fakes plus a scratch plugins directory.
pub struct TestEnv {
    pub store: Arc<MemoryConfigStore>,
    pub database: Arc<MemoryDatabase>,
    pub databases: Arc<StaticDatabaseFactory>,
    pub remote: Arc<StubRemoteApi>,
    pub log: Arc<RecordingLog>,
    pub plugins: TempDir,
}

impl TestEnv {
    /// Environment whose integrated database has the given prefix and tables.
    pub fn new(prefix: &str, tables: &[&str]) -> Self {
        let database = Arc::new(MemoryDatabase::new(prefix, tables));
        Self {
            store: Arc::new(MemoryConfigStore::new()),
            databases: Arc::new(StaticDatabaseFactory::new(Arc::clone(&database))),
            database,
            remote: Arc::new(StubRemoteApi::new()),
            log: Arc::new(RecordingLog::new()),
            plugins: tempfile::tempdir().unwrap(),
        }
    }

    /// Create plugin files under `<plugins>/<plugin>/`.
    pub fn install_files(&self, plugin: &str, files: &[&str]) {
        let dir = self.plugins.path().join(plugin);
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), b"\0asm").unwrap();
        }
    }

    pub fn plugins_dir(&self) -> &Path {
        self.plugins.path()
    }

    /// Build an admin context over the fakes.
    pub fn context(&self) -> AdminContext {
        AdminContext::new(
            self.store.clone(),
            self.databases.clone(),
            self.remote.clone(),
        )
        .with_log(self.log.clone())
        .with_plugins_dir(self.plugins.path())
    }
}
