//! Message lookup for operator-facing text.
//!
//! Messages are addressed by key. The built-in catalog carries English text;
//! a host can layer its own translations on top.

use dashmap::DashMap;

/// Message keys used by the admin operations.
pub mod keys {
    pub const NO_DATABASE: &str = "NO_DATABASE";
    pub const NO_FILES: &str = "NO_FILES";
    pub const NO_TABLE: &str = "NO_TABLE";
    pub const ERROR_SOURCE_PATH: &str = "ERROR_SOURCE_PATH";
    pub const GOOD_CONFIG: &str = "GOOD_CONFIG";
    pub const SOURCE_PATH_NOT_FOUND: &str = "SOURCE_PATH_NOT_FOUND";
    pub const DISABLE_REGISTRATION: &str = "DISABLE_REGISTRATION";
    pub const ENABLE_REGISTRATION: &str = "ENABLE_REGISTRATION";
    pub const BEST_COOKIE_DOMAIN: &str = "BEST_COOKIE_DOMAIN";
    pub const BEST_COOKIE_PATH: &str = "BEST_COOKIE_PATH";
    pub const NO_RECORD: &str = "NO_RECORD";
}

const ENGLISH: &[(&str, &str)] = &[
    (keys::NO_DATABASE, "Could not connect to the database"),
    (keys::NO_FILES, "Plugin file missing:"),
    (keys::NO_TABLE, "table not found in the database"),
    (
        keys::ERROR_SOURCE_PATH,
        "The source path must be a filesystem path, not a URL",
    ),
    (keys::GOOD_CONFIG, "The configuration is valid"),
    (
        keys::SOURCE_PATH_NOT_FOUND,
        "The source path does not exist on this server",
    ),
    (
        keys::DISABLE_REGISTRATION,
        "New user registration is allowed, but this instance is a registration slave. Disable registration in the integrated software.",
    ),
    (
        keys::ENABLE_REGISTRATION,
        "New user registration is disabled, but this instance is the registration master. Enable registration in the integrated software.",
    ),
    (
        keys::BEST_COOKIE_DOMAIN,
        "Dual login will most likely work with this cookie domain:",
    ),
    (
        keys::BEST_COOKIE_PATH,
        "Dual login will most likely work with this cookie path:",
    ),
    (keys::NO_RECORD, "No integration instance is stored under this name"),
];

/// Resolves a message key to display text.
pub trait Translator: Send + Sync {
    fn text(&self, key: &str) -> String;
}

/// In-memory message catalog.
///
/// Lookups check overrides first, then the built-in English text, and fall
/// back to the key itself.
#[derive(Debug, Default)]
pub struct Catalog {
    overrides: DashMap<String, String>,
}

impl Catalog {
    /// Catalog with only the built-in English messages.
    pub fn english() -> Self {
        Self::default()
    }

    /// Replace the text of a key.
    pub fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        self.overrides.insert(key.into(), text.into());
    }

    /// Replace the text of several keys.
    pub fn extend<K: Into<String>, V: Into<String>>(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) {
        for (key, text) in entries {
            self.insert(key, text);
        }
    }
}

impl Translator for Catalog {
    fn text(&self, key: &str) -> String {
        if let Some(text) = self.overrides.get(key) {
            return text.clone();
        }

        ENGLISH
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| (*text).to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
