//! Configuration validation errors.
//!
//! Every variant carries the localized label resolved at the point of
//! failure plus the offending value, so the message can be shown to the
//! administrator as-is.

use thiserror::Error;

/// Reasons an integration instance is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The integrated software's database could not be opened or pinged.
    #[error("{label}{}", detail_suffix(.detail))]
    DatabaseUnavailable {
        label: String,
        detail: Option<String>,
    },

    /// The host's own database could not be reached.
    #[error("{instance} -> host {label}{}", detail_suffix(.detail))]
    HostDatabaseUnavailable {
        instance: String,
        label: String,
        detail: Option<String>,
    },

    /// A plugin implementation file is missing from the plugin directory.
    #[error("{label} {file}")]
    MissingFile { label: String, file: String },

    /// The remote API of the cookie domain did not answer the ping.
    #[error("{url} {message}")]
    RemoteApiUnreachable { url: String, message: String },

    /// `source_path` holds a URL instead of a filesystem path.
    #[error("{label} : {path}")]
    InvalidSourcePath { label: String, path: String },

    /// The user table of the integrated software does not exist.
    #[error("{table}: {label}")]
    MissingTable { label: String, table: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(" : {detail}"),
        None => String::new(),
    }
}

impl ConfigError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseUnavailable { .. } => "database_unavailable",
            Self::HostDatabaseUnavailable { .. } => "host_database_unavailable",
            Self::MissingFile { .. } => "missing_file",
            Self::RemoteApiUnreachable { .. } => "remote_api_unreachable",
            Self::InvalidSourcePath { .. } => "invalid_source_path",
            Self::MissingTable { .. } => "missing_table",
        }
    }
}
