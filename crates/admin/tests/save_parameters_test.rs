#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for parameter persistence.

use std::path::MAIN_SEPARATOR;

use serde_json::json;

use userbridge_admin::admin::{DefaultAdmin, PluginInstance, save_parameters};
use userbridge_admin::log::Severity;
use userbridge_admin::params::Params;
use userbridge_test_utils::{TestEnv, test_record};

fn admin() -> DefaultAdmin {
    DefaultAdmin::new(PluginInstance::new("forum", "phpbb"))
}

fn env_with(params: serde_json::Value) -> TestEnv {
    let env = TestEnv::new("", &[]);
    env.store
        .insert(test_record("forum", "phpbb").with_params(params).build());
    env
}

fn post(pairs: &[(&str, &str)]) -> Params {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

#[tokio::test]
async fn source_url_is_normalized_before_storage() {
    let env = env_with(json!({}));

    let saved = save_parameters(
        &env.context(),
        &admin(),
        post(&[("source_url", "example.com")]),
        false,
    )
    .await;

    assert!(saved);
    assert_eq!(
        env.store.stored_params("forum").get_str("source_url").as_deref(),
        Some("http://example.com/")
    );
    assert!(env.log.entries().is_empty());
}

#[tokio::test]
async fn missing_source_path_warns_but_saves() {
    let env = env_with(json!({}));
    let missing = env.plugins_dir().join("not-there");
    let missing = missing.to_str().unwrap().to_string();

    let saved = save_parameters(
        &env.context(),
        &admin(),
        post(&[("source_path", missing.as_str())]),
        false,
    )
    .await;

    assert!(saved);
    assert_eq!(env.log.count(Severity::Warning), 1);
    assert_eq!(
        env.store.stored_params("forum").get_str("source_path"),
        Some(format!("{missing}{MAIN_SEPARATOR}"))
    );
}

#[tokio::test]
async fn existing_source_path_saves_quietly() {
    let env = env_with(json!({}));
    let existing = env.plugins_dir().to_str().unwrap().to_string();

    let saved = save_parameters(
        &env.context(),
        &admin(),
        post(&[("source_path", existing.as_str())]),
        false,
    )
    .await;

    assert!(saved);
    assert!(env.log.entries().is_empty());
}

#[tokio::test]
async fn empty_source_path_is_left_alone() {
    let env = env_with(json!({}));

    assert!(save_parameters(&env.context(), &admin(), post(&[("source_path", "")]), false).await);
    assert_eq!(
        env.store.stored_params("forum").get_str("source_path").as_deref(),
        Some("")
    );
    assert!(env.log.entries().is_empty());
}

#[tokio::test]
async fn wizard_merges_over_stored_params() {
    let env = env_with(json!({"a": "1", "b": "old"}));

    assert!(save_parameters(&env.context(), &admin(), post(&[("b", "2")]), true).await);

    let stored = env.store.stored_params("forum");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.get_str("a").as_deref(), Some("1"));
    assert_eq!(stored.get_str("b").as_deref(), Some("2"));
}

#[tokio::test]
async fn plain_save_replaces_stored_params() {
    let env = env_with(json!({"a": "1", "b": "old"}));

    assert!(save_parameters(&env.context(), &admin(), post(&[("b", "2")]), false).await);

    let stored = env.store.stored_params("forum");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.get_str("b").as_deref(), Some("2"));
}

#[tokio::test]
async fn wizard_over_malformed_params_starts_fresh() {
    let env = TestEnv::new("", &[]);
    env.store
        .insert(test_record("forum", "phpbb").with_raw_params("a=1&b=2").build());

    assert!(save_parameters(&env.context(), &admin(), post(&[("b", "2")]), true).await);
    assert_eq!(env.store.stored_params("forum").len(), 1);
}

#[tokio::test]
async fn write_failure_returns_false_and_logs_once() {
    let env = env_with(json!({}));
    env.store.set_fail_writes(true);

    let saved = save_parameters(
        &env.context(),
        &admin(),
        post(&[("source_url", "example.com")]),
        false,
    )
    .await;

    assert!(!saved);
    let entries = env.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[0].instance.as_deref(), Some("forum"));
    assert!(entries[0].message.contains("simulated write failure"));
}

#[tokio::test]
async fn wizard_read_failure_returns_false_and_logs_once() {
    let env = env_with(json!({"a": "1"}));
    env.store.set_fail_reads(true);

    assert!(!save_parameters(&env.context(), &admin(), post(&[("b", "2")]), true).await);
    assert_eq!(env.log.count(Severity::Error), 1);
    assert_eq!(env.store.write_count(), 0);
}

#[tokio::test]
async fn unknown_instance_is_a_failure() {
    let env = TestEnv::new("", &[]);

    assert!(!save_parameters(&env.context(), &admin(), post(&[("a", "1")]), false).await);
    assert_eq!(env.log.count(Severity::Error), 1);
}

#[tokio::test]
async fn empty_instance_name_saves_nothing() {
    let env = env_with(json!({}));
    let nameless = DefaultAdmin::new(PluginInstance::new("", "phpbb"));

    assert!(!save_parameters(&env.context(), &nameless, post(&[("a", "1")]), false).await);
    assert_eq!(env.store.write_count(), 0);
    assert!(env.log.entries().is_empty());
}

#[tokio::test]
async fn save_resets_cached_params() {
    let env = env_with(json!({"cookie_path": "/forum"}));
    let ctx = env.context();

    let before = ctx.params().get("forum").await.unwrap();
    assert_eq!(before.get_str("cookie_path").as_deref(), Some("/forum"));

    assert!(save_parameters(&ctx, &admin(), post(&[("cookie_path", "/")]), true).await);

    let after = ctx.params().get("forum").await.unwrap();
    assert_eq!(after.get_str("cookie_path").as_deref(), Some("/"));
}
