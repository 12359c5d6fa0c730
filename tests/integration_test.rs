//! REST API 統合テスト（インメモリリポジトリ・スタブ送信使用）
//!
//! tower::ServiceExt + oneshot でルーターを直接呼び出す。

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use k1s0_notification_channel_server::adapter::handler::{self, AppState};
use k1s0_notification_channel_server::adapter::repository::InMemoryChannelConfigRepository;
use k1s0_notification_channel_server::domain::entity::channel_type::ChannelType;
use k1s0_notification_channel_server::domain::service::{
    ChannelRegistry, HostPolicy, NotificationSettings,
};
use k1s0_notification_channel_server::usecase::config_validator::ConfigPolicy;
use k1s0_notification_channel_server::infrastructure::delivery::http_client::{
    HttpFailure, HttpReply, HttpRequest, HttpTransport,
};
use k1s0_notification_channel_server::infrastructure::delivery::HttpWebhookDeliveryClient;
use k1s0_notification_channel_server::infrastructure::host_deny_list::DenyListHostPolicy;
use k1s0_notification_channel_server::infrastructure::settings::LiveSettings;
use k1s0_notification_channel_server::test_support::{
    make_in_memory_app_state, make_in_memory_app_state_with_settings, make_test_app_state,
    stub_transports, StubEmailClient, StubSnsClient, StubWebhookClient,
};
use k1s0_notification_channel_server::usecase::Transports;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> AppState {
    make_in_memory_app_state(stub_transports()).0
}

async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = handler::router(state.clone());
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create(state: &AppState, config_id: &str, config: Value) -> (StatusCode, Value) {
    call(
        state,
        "POST",
        "/api/v1/configs",
        Some(json!({"config_id": config_id, "config": config})),
    )
    .await
}

fn slack(name: &str) -> Value {
    json!({
        "name": name,
        "config_type": "slack",
        "feature_list": ["alerting"],
        "slack": {"url": "https://hooks.slack.com/services/T/B/X"}
    })
}

fn chime(name: &str) -> Value {
    json!({
        "name": name,
        "config_type": "chime",
        "feature_list": ["reports"],
        "chime": {"url": "https://hooks.chime.aws/incomingwebhooks/abc?token=t"}
    })
}

fn webhook(name: &str, url: &str) -> Value {
    json!({
        "name": name,
        "config_type": "webhook",
        "feature_list": ["alerting"],
        "webhook": {"url": url}
    })
}

// ---------------------------------------------------------------------------
// Health / Readiness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_healthz_and_readyz() {
    let state = make_state();
    let (status, body) = call(&state, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, _) = call(&state, "GET", "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Config CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_get_update_delete_config() {
    let state = make_state();

    let (status, body) = create(&state, "slack-1", slack("ops")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["config_id"], "slack-1");

    let (status, body) = call(&state, "GET", "/api/v1/configs/slack-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config_id"], "slack-1");
    assert_eq!(body["config"]["name"], "ops");
    assert_eq!(body["config"]["config_type"], "slack");
    assert_eq!(body["config"]["is_enabled"], true);
    assert!(body["created_time_ms"].as_i64().is_some());

    let (status, _) = call(
        &state,
        "PUT",
        "/api/v1/configs/slack-1",
        Some(json!({"config": slack("renamed")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&state, "GET", "/api/v1/configs/slack-1", None).await;
    assert_eq!(body["config"]["name"], "renamed");

    let (status, body) = call(&state, "DELETE", "/api/v1/configs/slack-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delete_response_list"]["slack-1"], "OK");

    let (status, body) = call(&state, "GET", "/api/v1/configs/slack-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_NOT_FOUND");
}

#[tokio::test]
async fn test_create_duplicate_id_conflicts() {
    let state = make_state();
    let (status, _) = create(&state, "dup", slack("a")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = create(&state, "dup", chime("b")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_CONFLICT");

    let (_, body) = call(&state, "GET", "/api/v1/configs/dup", None).await;
    assert_eq!(body["config"]["config_type"], "slack");
}

#[tokio::test]
async fn test_update_type_change_conflicts() {
    let state = make_state();
    create(&state, "c-1", slack("a")).await;
    let (status, _) = call(
        &state,
        "PUT",
        "/api/v1/configs/c-1",
        Some(json!({"config": chime("b")})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_rejects_http_webhook_and_two_payloads() {
    let state = make_state();
    let (status, body) = create(&state, "w", webhook("w", "http://abc/com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_VALIDATION_ERROR");

    let mut both = slack("both");
    both["chime"] = json!({"url": "https://hooks.chime.aws/incomingwebhooks/abc?token=t"});
    let (status, _) = create(&state, "both", both).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_without_id_generates_one() {
    let state = make_state();
    let (status, body) = call(
        &state,
        "POST",
        "/api/v1/configs",
        Some(json!({"config": slack("generated")})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["config_id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    let (status, _) = call(&state, "GET", &format!("/api/v1/configs/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_many_fails_closed_when_any_missing() {
    let state = make_state();
    create(&state, "a", slack("a")).await;
    create(&state, "b", chime("b")).await;

    let (status, _) = call(&state, "DELETE", "/api/v1/configs?config_id_list=a,missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&state, "GET", "/api/v1/configs/a", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&state, "DELETE", "/api/v1/configs?config_id_list=a,b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delete_response_list"]["a"], "OK");
    assert_eq!(body["delete_response_list"]["b"], "OK");
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_query_by_type_returns_matching_configs() {
    let state = make_state();
    create(&state, "s", slack("s")).await;
    create(&state, "c", chime("c")).await;
    create(&state, "w", webhook("w", "https://abc/com")).await;

    let (status, body) = call(&state, "GET", "/api/v1/configs?config_type=slack,chime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 2);
    let mut ids: Vec<&str> = body["config_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["config_id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["c", "s"]);
}

#[tokio::test]
async fn test_query_sort_and_paging() {
    let state = make_state();
    for i in 0..5 {
        create(&state, &format!("id-{}", i), slack(&format!("name-{}", i))).await;
    }

    let (status, body) = call(
        &state,
        "GET",
        "/api/v1/configs?sort_field=name&sort_order=desc&from_index=1&max_items=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_index"], 1);
    assert_eq!(body["total_hits"], 5);
    let names: Vec<&str> = body["config_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["config"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["name-3", "name-2"]);
}

#[tokio::test]
async fn test_query_rejects_unknown_field_and_bad_order() {
    let state = make_state();
    let (status, body) = call(&state, "GET", "/api/v1/configs?colour=red", None).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_NOT_ACCEPTABLE");

    let (status, _) = call(&state, "GET", "/api/v1/configs?sort_order=sideways", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_multi_get_by_id_list() {
    let state = make_state();
    create(&state, "s", slack("s")).await;
    create(&state, "c", chime("c")).await;

    let (status, body) = call(&state, "GET", "/api/v1/configs?config_id_list=c,s", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 2);
    assert_eq!(body["config_list"][0]["config_id"], "c");

    let (status, _) = call(&state, "GET", "/api/v1/configs?config_id_list=c,x", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Channel lists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_channel_lists_only_sendable_types() {
    let state = make_state();
    create(&state, "s", slack("s")).await;
    create(&state, "c", chime("c")).await;
    create(
        &state,
        "acc",
        json!({
            "name": "smtp",
            "config_type": "smtp_account",
            "feature_list": ["alerting"],
            "smtp_account": {"host": "smtp.example.com", "port": 587, "method": "start_tls",
                             "from_address": "noreply@example.com"}
        }),
    )
    .await;

    let (status, body) = call(&state, "GET", "/api/v1/channels", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["channel_list"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|c| c["config_type"] != "smtp_account"));

    let (status, body) = call(&state, "GET", "/api/v1/features/alerting/channels", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["channel_list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["config_id"], "s");

    let (status, _) = call(&state, "GET", "/api/v1/features/paging/channels", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Email reference rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_email_requires_existing_account() {
    let state = make_state();
    let email = json!({
        "name": "mail",
        "config_type": "email",
        "feature_list": ["alerting"],
        "email": {"email_account_id": "missing-acc",
                  "recipient_list": [{"recipient": "a@example.com"}]}
    });
    let (status, body) = create(&state, "mail", email).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing-acc"));

    let (status, _) = call(&state, "GET", "/api/v1/configs/mail", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_send_reports_one_result_per_channel() {
    let state = make_state();
    create(&state, "s", slack("s")).await;
    let mut muted = chime("muted");
    muted["is_enabled"] = json!(false);
    create(&state, "m", muted).await;

    let (status, body) = call(
        &state,
        "POST",
        "/api/v1/send",
        Some(json!({
            "channel_ids": ["s", "m", "gone"],
            "message": {"title": "t", "text_description": "m"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["delivery_results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    let by_id = |id: &str| results.iter().find(|r| r["config_id"] == id).unwrap();
    assert_eq!(by_id("s")["delivery_status"]["status_code"], "200");
    assert_eq!(by_id("m")["delivery_status"]["status_code"], "LOCKED");
    assert_eq!(by_id("gone")["delivery_status"]["status_code"], "404");
    assert_eq!(by_id("gone")["config_name"], "invalid-config");
    assert_eq!(by_id("gone")["config_type"], "none");
}

#[tokio::test]
async fn test_send_email_fans_out_to_group_members() {
    let email_client = Arc::new(StubEmailClient::default());
    let transports = Transports {
        email: email_client.clone(),
        ..stub_transports()
    };
    let (state, _repo) = make_in_memory_app_state(transports);

    create(
        &state,
        "acc",
        json!({
            "name": "smtp",
            "config_type": "smtp_account",
            "feature_list": ["alerting"],
            "smtp_account": {"host": "smtp.example.com", "port": 587, "method": "start_tls",
                             "from_address": "noreply@example.com"}
        }),
    )
    .await;
    create(
        &state,
        "grp",
        json!({
            "name": "oncall",
            "config_type": "email_group",
            "email_group": {"recipient_list": ["b@example.com", {"recipient": "c@example.com"}]}
        }),
    )
    .await;
    let (status, _) = create(
        &state,
        "mail",
        json!({
            "name": "mail",
            "config_type": "email",
            "feature_list": ["alerting"],
            "email": {"email_account_id": "acc",
                      "recipient_list": [{"recipient": "mailto:a@example.com"}],
                      "email_group_id_list": ["grp"]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &state,
        "POST",
        "/api/v1/send",
        Some(json!({
            "channel_ids": ["mail"],
            "message": {"title": "t", "text_description": "m"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = &body["delivery_results"][0];
    assert_eq!(result["config_type"], "email");
    assert_eq!(result["delivery_status"]["status_code"], "200");
    assert_eq!(result["email_recipient_status"].as_array().unwrap().len(), 3);

    let mut recipients: Vec<String> = email_client.sent().into_iter().map(|t| t.recipient).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["a@example.com", "b@example.com", "c@example.com"]);
}

#[tokio::test]
async fn test_send_rejects_empty_message() {
    let state = make_state();
    create(&state, "s", slack("s")).await;
    let (status, _) = call(
        &state,
        "POST",
        "/api/v1/send",
        Some(json!({
            "channel_ids": ["s"],
            "message": {"title": "t", "text_description": ""}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 本文なしで 200 を返す HTTP トランスポート。
struct NullEntityTransport;

#[async_trait]
impl HttpTransport for NullEntityTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpReply, HttpFailure> {
        Ok(HttpReply {
            status: 200,
            body: None,
        })
    }
}

#[tokio::test]
async fn test_webhook_null_entity_end_to_end() {
    let settings = Arc::new(LiveSettings::new(NotificationSettings::default()));
    let host_policy: Arc<dyn HostPolicy> = Arc::new(DenyListHostPolicy::new(settings.clone()));
    let transports = Transports {
        webhook: Arc::new(HttpWebhookDeliveryClient::new(
            Arc::new(NullEntityTransport),
            host_policy,
        )),
        sns: Arc::new(StubSnsClient),
        ..stub_transports()
    };
    let (state, _repo) = make_in_memory_app_state_with_settings(transports, settings);
    create(&state, "hook", webhook("hook", "https://abc/com")).await;

    let send = json!({
        "channel_ids": ["hook"],
        "message": {"title": "t", "text_description": "m"}
    });
    let (status, body) = call(&state, "POST", "/api/v1/send", Some(send.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let delivery = &body["delivery_results"][0]["delivery_status"];
    assert_eq!(delivery["status_code"], "200");
    assert_eq!(delivery["status_text"], "{}");

    let (status, body) = call(
        &state,
        "PUT",
        "/api/v1/settings",
        Some(json!({"host_deny_list": ["abc"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["host_deny_list"], json!(["abc"]));

    let (_, body) = call(&state, "POST", "/api/v1/send", Some(send)).await;
    let delivery = &body["delivery_results"][0]["delivery_status"];
    assert_eq!(delivery["status_code"], "403");
    assert_eq!(delivery["status_text"], "Host abc is denied");
}

#[tokio::test]
async fn test_settings_get_and_partial_update() {
    let state = make_state();

    let (status, body) = call(&state, "GET", "/api/v1/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_html_sanitization_enabled"], true);
    assert_eq!(body["host_deny_list"], json!([]));

    let (status, body) = call(
        &state,
        "PUT",
        "/api/v1/settings",
        Some(json!({
            "email_html_sanitization_enabled": false,
            "host_deny_list": ["10.0.0.0/8"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_html_sanitization_enabled"], false);

    let (_, body) = call(&state, "GET", "/api/v1/settings", None).await;
    assert_eq!(body["email_html_sanitization_enabled"], false);
    assert_eq!(body["host_deny_list"], json!(["10.0.0.0/8"]));
    assert_eq!(
        body["email_html_sanitization_allow_list"],
        json!(NotificationSettings::default().email_html_sanitization_allow_list)
    );
}

#[tokio::test]
async fn test_settings_update_rejects_blank_entry() {
    let state = make_state();

    let (status, body) = call(
        &state,
        "PUT",
        "/api/v1/settings",
        Some(json!({"host_deny_list": ["ok.example.com", "  "]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_VALIDATION_ERROR");

    let (_, body) = call(&state, "GET", "/api/v1/settings", None).await;
    assert_eq!(body["host_deny_list"], json!([]));
}

#[tokio::test]
async fn test_send_test_message_to_saved_config() {
    let webhook_client = Arc::new(StubWebhookClient::default());
    let transports = Transports {
        webhook: webhook_client.clone(),
        ..stub_transports()
    };
    let (state, _repo) = make_in_memory_app_state(transports);
    create(&state, "s", slack("s")).await;

    let (status, body) = call(&state, "POST", "/api/v1/configs/s/test", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["delivery_results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["config_id"], "s");
    assert_eq!(results[0]["delivery_status"]["status_code"], "200");
    assert_eq!(webhook_client.sent().len(), 1);
}

#[tokio::test]
async fn test_send_test_message_to_missing_config_is_not_found() {
    let state = make_state();

    let (status, body) = call(&state, "POST", "/api/v1/configs/nope/test", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "SYS_NOTIFCH_NOT_FOUND");
}

#[tokio::test]
async fn test_plugin_features_lists_allowed_types() {
    let state = make_state();

    let (status, body) = call(&state, "GET", "/api/v1/features", None).await;
    assert_eq!(status, StatusCode::OK);
    let types = body["allowed_config_type_list"].as_array().unwrap();
    assert!(types.contains(&json!("slack")));
    assert!(types.contains(&json!("email")));
    assert_eq!(body["plugin_features"]["tooltip_support"], "true");
}

#[tokio::test]
async fn test_plugin_features_follow_policy() {
    let repo = Arc::new(InMemoryChannelConfigRepository::new(Arc::new(
        ChannelRegistry::new(),
    )));
    let policy = ConfigPolicy {
        allowed_config_types: [ChannelType::Slack, ChannelType::Sns].into_iter().collect(),
        ..ConfigPolicy::default()
    };
    let state = make_test_app_state(repo, stub_transports(), policy);

    let (_, body) = call(&state, "GET", "/api/v1/features", None).await;
    assert_eq!(body["allowed_config_type_list"], json!(["slack", "sns"]));
}
