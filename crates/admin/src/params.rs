//! Instance parameters and the read-through parameter cache.
//!
//! Parameters live in the `params` column of `integration_instance` as a
//! JSON object of scalar values. [`ParamCache`] keeps one parsed copy per
//! instance until it is explicitly reset after a save.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::store::ConfigStore;

/// Maximum number of instances kept in the cache.
const CACHE_MAX_CAPACITY: u64 = 1_000;

/// Cached parameters expire after this long even without a reset.
const CACHE_TTL_SECS: u64 = 300;

/// Key/value configuration of one integration instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stored parameter text.
    ///
    /// Empty or malformed text yields an empty set; stored garbage must never
    /// prevent an instance from being read.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Map<String, Value>>(raw) {
            Ok(map) => Self(map),
            Err(e) => {
                debug!(error = %e, "ignoring malformed stored params");
                Self::default()
            }
        }
    }

    /// Serialize to the stored text form.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` holds a value. A stored `null` counts as unset.
    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|value| !value.is_null())
    }

    /// Get a value rendered as a string.
    ///
    /// Numbers and booleans are rendered; `null`, arrays and objects are not.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Get a value as a non-empty string, treating `""` as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    /// Get a list value: either a JSON array or a comma-separated string.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            Some(Value::Number(n)) => vec![n.to_string()],
            _ => Vec::new(),
        }
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Overlay these params on `base`; keys present here win.
    pub fn merged_over(self, base: Params) -> Params {
        let mut merged = base.0;
        for (key, value) in self.0 {
            merged.insert(key, value);
        }
        Self(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Read-through cache of parsed parameters, keyed by instance name.
#[derive(Clone)]
pub struct ParamCache {
    store: Arc<dyn ConfigStore>,
    cache: Cache<String, Arc<Params>>,
}

impl ParamCache {
    /// Create a cache backed by the given config store.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .build();

        Self { store, cache }
    }

    /// Get the parameters of an instance, loading them on a miss.
    ///
    /// An instance without a stored row reads as empty params.
    pub async fn get(&self, instance: &str) -> Result<Arc<Params>> {
        if let Some(params) = self.cache.get(instance).await {
            return Ok(params);
        }

        let raw = self.store.load_params(instance).await?.unwrap_or_default();
        let params = Arc::new(Params::parse(&raw));
        self.cache
            .insert(instance.to_string(), Arc::clone(&params))
            .await;

        debug!(instance = %instance, keys = params.len(), "params loaded");
        Ok(params)
    }

    /// Drop the cached parameters of an instance so the next read reloads.
    pub async fn reset(&self, instance: &str) {
        self.cache.invalidate(instance).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_and_malformed_text() {
        assert!(Params::parse("").is_empty());
        assert!(Params::parse("   ").is_empty());
        assert!(Params::parse("not json").is_empty());
        assert!(Params::parse("[1, 2]").is_empty());
    }

    #[test]
    fn parse_stored_object() {
        let params = Params::parse(r#"{"source_url":"http://example.com/","debug":true,"port":3306}"#);
        assert_eq!(params.get_str("source_url").as_deref(), Some("http://example.com/"));
        assert_eq!(params.get_str("debug").as_deref(), Some("true"));
        assert_eq!(params.get_str("port").as_deref(), Some("3306"));
        assert_eq!(params.get_str("missing"), None);
    }

    #[test]
    fn merged_over_prefers_new_values() {
        let existing: Params = [("a", "1"), ("b", "old")].into_iter().collect();
        let submitted: Params = [("b", "2")].into_iter().collect();

        let merged = submitted.merged_over(existing);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_str("a").as_deref(), Some("1"));
        assert_eq!(merged.get_str("b").as_deref(), Some("2"));
    }

    #[test]
    fn get_list_accepts_arrays_and_comma_strings() {
        let mut params = Params::new();
        params.set("groups", serde_json::json!(["2", 3]));
        params.set("csv", "4, 5,,6");

        assert_eq!(params.get_list("groups"), vec!["2", "3"]);
        assert_eq!(params.get_list("csv"), vec!["4", "5", "6"]);
        assert!(params.get_list("missing").is_empty());
    }

    #[test]
    fn get_non_empty_treats_blank_as_unset() {
        let mut params = Params::new();
        params.set("source_path", "");
        assert_eq!(params.get_non_empty("source_path"), None);
        assert!(params.is_set("source_path"));
    }

    #[test]
    fn null_is_unset() {
        let params = Params::parse(r#"{"cookie_domain": null, "cookie_path": "/"}"#);
        assert!(!params.is_set("cookie_domain"));
        assert!(params.is_set("cookie_path"));
        assert!(!params.is_set("missing"));
    }

    #[test]
    fn to_json_parses_back() {
        let mut params = Params::new();
        params.set("cookie_path", "/");
        let restored = Params::parse(&params.to_json());
        assert_eq!(restored, params);
    }
}
