//! Configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::context::DEFAULT_HOST_INSTANCE;

/// Operator CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL of the host database.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Path to plugins directory (default: ./plugins).
    pub plugins_dir: PathBuf,

    /// Instance name of the host CMS (default: host).
    pub host_instance: String,

    /// Remote API base URL per cookie domain, from
    /// `API_ENDPOINTS=domain=url,domain=url`.
    pub api_endpoints: HashMap<String, String>,

    /// Remote API request timeout in seconds (default: 10).
    pub api_timeout_secs: u64,

    /// Host name admin requests are served under (default: machine host name).
    pub server_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let plugins_dir = env::var("PLUGINS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./plugins"));

        let host_instance =
            env::var("HOST_INSTANCE").unwrap_or_else(|_| DEFAULT_HOST_INSTANCE.to_string());

        let api_endpoints = match env::var("API_ENDPOINTS") {
            Ok(raw) => parse_endpoints(&raw)?,
            Err(_) => HashMap::new(),
        };

        let api_timeout_secs = env::var("API_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("API_TIMEOUT_SECS must be a valid u64")?;

        let server_name = env::var("SERVER_NAME").unwrap_or_else(|_| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "localhost".to_string())
        });

        Ok(Self {
            database_url,
            database_max_connections,
            plugins_dir,
            host_instance,
            api_endpoints,
            api_timeout_secs,
            server_name,
        })
    }
}

/// Parse `domain=url` pairs separated by commas.
fn parse_endpoints(raw: &str) -> Result<HashMap<String, String>> {
    let mut endpoints = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((domain, url)) = entry.split_once('=') else {
            bail!("API_ENDPOINTS entry '{entry}' must look like domain=url");
        };
        endpoints.insert(domain.trim().to_string(), url.trim().to_string());
    }
    Ok(endpoints)
}
