#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for status reporting.

use userbridge_admin::admin::{DefaultAdmin, PluginInstance, update_status};
use userbridge_admin::log::Severity;
use userbridge_admin::store::{STATUS_CONFIGURED, STATUS_ERROR};
use userbridge_test_utils::{TestEnv, test_record};

fn admin() -> DefaultAdmin {
    DefaultAdmin::new(PluginInstance::new("forum", "phpbb"))
}

#[tokio::test]
async fn status_is_written() {
    let env = TestEnv::new("", &[]);
    env.store.insert(test_record("forum", "phpbb").build());

    update_status(&env.context(), &admin(), STATUS_CONFIGURED).await;

    assert_eq!(env.store.record("forum").unwrap().status, STATUS_CONFIGURED);
    assert!(env.log.entries().is_empty());
}

#[tokio::test]
async fn status_overwrites_previous_value() {
    let env = TestEnv::new("", &[]);
    env.store.insert(
        test_record("forum", "phpbb")
            .with_status(STATUS_CONFIGURED)
            .build(),
    );

    update_status(&env.context(), &admin(), STATUS_ERROR).await;

    assert_eq!(env.store.record("forum").unwrap().status, STATUS_ERROR);
}

#[tokio::test]
async fn write_failure_is_logged_once() {
    let env = TestEnv::new("", &[]);
    env.store.insert(test_record("forum", "phpbb").build());
    env.store.set_fail_writes(true);

    update_status(&env.context(), &admin(), STATUS_CONFIGURED).await;

    let entries = env.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[0].instance.as_deref(), Some("forum"));
    assert_eq!(env.store.record("forum").unwrap().status, 0);
}

#[tokio::test]
async fn unknown_instance_is_logged() {
    let env = TestEnv::new("", &[]);

    update_status(&env.context(), &admin(), STATUS_CONFIGURED).await;

    assert_eq!(env.log.count(Severity::Error), 1);
    assert!(env.log.messages(Severity::Error)[0].ends_with(": forum"));
}
