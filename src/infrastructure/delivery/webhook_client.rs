use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::http_client::{HttpFailure, HttpRequest, HttpTransport};
use crate::domain::entity::delivery_result::DeliveryStatus;
use crate::domain::entity::destination::{BodyStyle, WebhookTarget};
use crate::domain::entity::message::MessageContent;
use crate::domain::service::{DeliveryError, HostPolicy, WebhookDeliveryClient};

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";
/// 本文を持たない (エンティティなし) 成功応答のステータステキスト。
const EMPTY_ENTITY: &str = "{}";

/// HttpWebhookDeliveryClient は Slack / Chime / Microsoft Teams / webhook 系の送信を行う。
///
/// 送信前に送信先ホストを拒否リストで判定し、拒否された場合は通信しない。
pub struct HttpWebhookDeliveryClient {
    http: Arc<dyn HttpTransport>,
    host_policy: Arc<dyn HostPolicy>,
}

impl HttpWebhookDeliveryClient {
    pub fn new(http: Arc<dyn HttpTransport>, host_policy: Arc<dyn HostPolicy>) -> Self {
        Self { http, host_policy }
    }
}

/// 送信先に合わせた JSON 本文を組み立てる。
///
/// `Content` 形式では本文自体が JSON オブジェクトならそのまま送る。
pub fn build_request_body(style: BodyStyle, message: &MessageContent) -> String {
    match style {
        BodyStyle::Text => json!({ "text": message.build_message_with_title() }).to_string(),
        BodyStyle::Content => {
            let raw = message.text_description.trim();
            if serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw).is_ok() {
                message.text_description.clone()
            } else {
                json!({ "Content": message.build_message_with_title() }).to_string()
            }
        }
    }
}

#[async_trait]
impl WebhookDeliveryClient for HttpWebhookDeliveryClient {
    async fn send(
        &self,
        target: &WebhookTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        let url = url::Url::parse(&target.url)
            .map_err(|e| DeliveryError::InvalidDestination(format!("{}: {}", target.url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| DeliveryError::InvalidDestination(format!("{} has no host", target.url)))?;

        if self.host_policy.is_host_denied(host) {
            tracing::warn!(host = %host, "webhook host is denied");
            return Ok(DeliveryStatus::new("403", format!("Host {} is denied", host)));
        }

        let mut headers = target.headers.clone();
        if !headers.keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
            headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        }
        let request = HttpRequest {
            method: target.method.clone(),
            url: target.url.clone(),
            headers,
            body: build_request_body(target.body_style, message),
        };

        let status = match self.http.execute(request).await {
            Ok(reply) if (200..=207).contains(&reply.status) => {
                tracing::info!(host = %host, status = reply.status, "webhook delivered");
                DeliveryStatus::new(
                    reply.status.to_string(),
                    reply.body.unwrap_or_else(|| EMPTY_ENTITY.to_string()),
                )
            }
            Ok(reply) => {
                tracing::warn!(host = %host, status = reply.status, "webhook rejected");
                DeliveryStatus::new(
                    reply.status.to_string(),
                    format!("Failed: {}", reply.body.unwrap_or_default()),
                )
            }
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "webhook request failed");
                let code = match e {
                    HttpFailure::Timeout(_) => "408",
                    HttpFailure::Connect(_) => "503",
                    HttpFailure::Other(_) => "500",
                };
                DeliveryStatus::new(code, format!("Failed to send message {}", e))
            }
        };
        Ok(status)
    }
}
