#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for operator commands.

use serde_json::json;

use userbridge_admin::admin::REQUIRED_FILES;
use userbridge_admin::cli;
use userbridge_admin::store::{STATUS_CONFIGURED, STATUS_ERROR, STATUS_UNCONFIGURED};
use userbridge_test_utils::{TestEnv, test_record};

#[tokio::test]
async fn register_creates_unconfigured_instance() {
    let env = TestEnv::new("", &[]);

    cli::cmd_register(&env.context(), "forum", "phpbb").await.unwrap();

    let record = env.store.record("forum").unwrap();
    assert_eq!(record.plugin, "phpbb");
    assert_eq!(record.status, STATUS_UNCONFIGURED);
    assert!(record.params().is_empty());
}

#[tokio::test]
async fn register_leaves_existing_instance_alone() {
    let env = TestEnv::new("", &[]);
    env.store.insert(
        test_record("forum", "phpbb")
            .with_params(json!({"user_table": "users"}))
            .build(),
    );

    let err = cli::cmd_register(&env.context(), "forum", "smf").await.unwrap_err();

    assert!(err.to_string().contains("already exists"));
    let record = env.store.record("forum").unwrap();
    assert_eq!(record.plugin, "phpbb");
    assert_eq!(record.params().get_str("user_table").as_deref(), Some("users"));
}

#[tokio::test]
async fn register_rejects_blank_names() {
    let env = TestEnv::new("", &[]);

    assert!(cli::cmd_register(&env.context(), " ", "phpbb").await.is_err());
    assert!(cli::cmd_register(&env.context(), "forum", "").await.is_err());
    assert_eq!(env.store.write_count(), 0);
}

#[tokio::test]
async fn registered_instance_can_be_saved_and_checked() {
    let env = TestEnv::new("jos_", &["jos_users"]);
    env.install_files("phpbb", &REQUIRED_FILES);
    let ctx = env.context();

    cli::cmd_register(&ctx, "forum", "phpbb").await.unwrap();
    cli::cmd_save(&ctx, "forum", &["user_table=users".to_string()], true)
        .await
        .unwrap();
    cli::cmd_check(&ctx, "forum").await.unwrap();

    assert_eq!(env.store.record("forum").unwrap().status, STATUS_CONFIGURED);
}

#[tokio::test]
async fn failed_check_records_error_status() {
    let env = TestEnv::new("jos_", &[]);
    env.install_files("phpbb", &REQUIRED_FILES);
    env.store.insert(
        test_record("forum", "phpbb")
            .with_params(json!({"user_table": "users"}))
            .build(),
    );

    let err = cli::cmd_check(&env.context(), "forum").await.unwrap_err();

    assert!(err.to_string().ends_with("[missing_table]"));
    assert_eq!(env.store.record("forum").unwrap().status, STATUS_ERROR);
}
