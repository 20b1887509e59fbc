//! Settings persistence through the HTTP API.
//!
//! Covers:
//! - Fresh installs serve defaults without writing a record
//! - Single-field updates are persisted to disk as camelCase JSON
//! - Stored settings survive a restart
//! - Corrupt records fall back to defaults
//! - Reset restores defaults and deletes the record
//! - Invalid updates are rejected
//! - The last visited page only accepts local paths

use pos_dashboard_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn patch(ctx: &TestContext, body: Value) -> (StatusCode, Value) {
    let resp = ctx
        .client
        .patch(ctx.url("/api/settings"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn current(ctx: &TestContext) -> Value {
    ctx.client
        .get(ctx.url("/api/settings"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Settings are not JSON")
}

#[tokio::test]
async fn test_defaults_without_record() {
    let ctx = TestContext::start().await;

    let settings = current(&ctx).await;
    assert_eq!(settings["theme"], "light");
    assert_eq!(settings["currency"], "USD");
    assert_eq!(settings["timeFormat"], "12");
    assert_eq!(settings["autoSave"], true);
    assert!(ctx.stored_settings().is_none());
}

#[tokio::test]
async fn test_update_is_written_to_disk() {
    let ctx = TestContext::start().await;

    let (status, settings) = patch(&ctx, json!({"key": "theme", "value": "dark"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "dark");

    let stored = ctx.stored_settings().expect("Record not written");
    assert_eq!(stored["theme"], "dark");
    assert_eq!(stored["sidebarCollapsed"], false);
    assert_eq!(stored["receiptTemplate"], "default");
}

#[tokio::test]
async fn test_stored_record_is_loaded_on_start() {
    let ctx = TestContext::start_with_settings(
        r#"{"theme":"dark","currency":"GBP","timeFormat":"24"}"#,
    )
    .await;

    let settings = current(&ctx).await;
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["currency"], "GBP");
    assert_eq!(settings["timeFormat"], "24");
    assert_eq!(settings["language"], "en");
}

#[tokio::test]
async fn test_corrupt_record_falls_back_to_defaults() {
    let ctx = TestContext::start_with_settings("{not json").await;

    let settings = current(&ctx).await;
    assert_eq!(settings["theme"], "light");
    assert_eq!(settings["currency"], "USD");
}

#[tokio::test]
async fn test_reset_deletes_record() {
    let ctx = TestContext::start().await;
    patch(&ctx, json!({"key": "currency", "value": "EUR"})).await;
    assert!(ctx.stored_settings().is_some());

    let resp = ctx
        .client
        .delete(ctx.url("/api/settings"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let settings: Value = resp.json().await.expect("Settings are not JSON");
    assert_eq!(settings["currency"], "USD");

    assert!(ctx.stored_settings().is_none());
    assert_eq!(current(&ctx).await["currency"], "USD");
}

#[tokio::test]
async fn test_invalid_update_is_rejected() {
    let ctx = TestContext::start().await;

    let (status, _) = patch(&ctx, json!({"key": "theme", "value": "blue"})).await;
    assert!(status.is_client_error());

    let (status, _) = patch(&ctx, json!({"key": "fontSize", "value": 14})).await;
    assert!(status.is_client_error());

    assert!(ctx.stored_settings().is_none());
}

#[tokio::test]
async fn test_last_visited_page_rejects_scripts() {
    let ctx = TestContext::start().await;

    let (status, _) = patch(
        &ctx,
        json!({"key": "lastVisitedPage", "value": "javascript:alert(document.cookie)"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(current(&ctx).await["lastVisitedPage"], "/");

    let (status, settings) = patch(
        &ctx,
        json!({"key": "lastVisitedPage", "value": "/subscription"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["lastVisitedPage"], "/subscription");
}
