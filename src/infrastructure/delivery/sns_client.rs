use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_sns::error::{DisplayErrorContext, ProvideErrorMetadata};

use crate::domain::entity::delivery_result::DeliveryStatus;
use crate::domain::entity::destination::SnsTarget;
use crate::domain::entity::message::MessageContent;
use crate::domain::service::{DeliveryError, SnsDeliveryClient};

const SESSION_NAME: &str = "k1s0-notification-channel";

/// SnsPublishRequest はトピックへの発行 1 回分を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsPublishRequest {
    pub region: String,
    pub topic_arn: String,
    pub role_arn: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SnsFailure {
    /// SNS が返したエラー（エラーコードとメッセージ）。
    #[error("{code}:{message}")]
    Service { code: String, message: String },

    /// 通信や認証情報の取得など SDK 側の失敗。
    #[error("{0}")]
    Sdk(String),
}

/// SnsPublisher は SNS の Publish 呼び出しを抽象化する。成功時はメッセージ ID を返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnsPublisher: Send + Sync {
    async fn publish(&self, request: &SnsPublishRequest) -> Result<String, SnsFailure>;
}

/// SnsClientOptions は SDK の基本設定と通信タイムアウト。
#[derive(Debug, Clone, Default)]
pub struct SnsClientOptions {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
}

/// 接続・読み取り・1 試行あたりのタイムアウトを設定値から組み立てる。
pub fn timeout_config(connect_timeout: Duration, socket_timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(socket_timeout)
        .operation_attempt_timeout(connect_timeout + socket_timeout)
        .build()
}

/// AwsSnsPublisher は aws-sdk-sns による SnsPublisher 実装。
///
/// リージョンは発行ごとにトピック ARN から決め、`role_arn` があれば STS でロールを引き受ける。
pub struct AwsSnsPublisher {
    base: aws_config::SdkConfig,
}

impl AwsSnsPublisher {
    pub async fn new(options: SnsClientOptions) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .timeout_config(timeout_config(options.connect_timeout, options.socket_timeout));
        if let Some(ref r) = options.region {
            config_loader = config_loader.region(aws_config::Region::new(r.clone()));
        }
        if let Some(ref ep) = options.endpoint {
            config_loader = config_loader.endpoint_url(ep);
        }
        Self {
            base: config_loader.load().await,
        }
    }

    async fn client(&self, region: &str, role_arn: Option<&str>) -> aws_sdk_sns::Client {
        let region = aws_config::Region::new(region.to_string());
        let mut builder = aws_sdk_sns::config::Builder::from(&self.base).region(region.clone());
        if let Some(role_arn) = role_arn {
            let provider = aws_config::sts::AssumeRoleProvider::builder(role_arn)
                .session_name(SESSION_NAME)
                .region(region)
                .configure(&self.base)
                .build()
                .await;
            builder = builder.credentials_provider(provider);
        }
        aws_sdk_sns::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl SnsPublisher for AwsSnsPublisher {
    async fn publish(&self, request: &SnsPublishRequest) -> Result<String, SnsFailure> {
        let client = self.client(&request.region, request.role_arn.as_deref()).await;
        let output = client
            .publish()
            .topic_arn(&request.topic_arn)
            .message(&request.message)
            .set_subject(request.subject.clone())
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service) => SnsFailure::Service {
                    code: service.code().unwrap_or("Unknown").to_string(),
                    message: service.message().unwrap_or_default().to_string(),
                },
                None => SnsFailure::Sdk(DisplayErrorContext(&e).to_string()),
            })?;
        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

/// `arn:<partition>:sns:<region>:<account>:<name>` からリージョンを取り出す。
pub fn region_of_topic(topic_arn: &str) -> Option<&str> {
    let mut parts = topic_arn.split(':');
    match (parts.next(), parts.nth(1), parts.next()) {
        (Some("arn"), Some("sns"), Some(region)) if !region.is_empty() => Some(region),
        _ => None,
    }
}

/// SNS のエラーコードを HTTP ステータスに対応付ける。
fn status_of_error_code(code: &str) -> &'static str {
    match code {
        "InvalidParameter" | "ParameterValueInvalid" | "InvalidParameterValue" => "400",
        "InternalError" | "InternalFailure" => "500",
        "NotFound" => "404",
        "EndpointDisabled" => "423",
        "PlatformApplicationDisabled" => "503",
        "AuthorizationError" | "KMSAccessDenied" | "InvalidSecurity" => "401",
        "KMSDisabled" | "KMSInvalidState" | "KMSNotFound" | "KMSOptInRequired" => "412",
        "KMSThrottling" | "Throttling" | "Throttled" => "429",
        _ => "424",
    }
}

/// AwsSnsDeliveryClient はメッセージ本文を SNS トピックへ発行する。件名はタイトル。
pub struct AwsSnsDeliveryClient {
    publisher: Arc<dyn SnsPublisher>,
}

impl AwsSnsDeliveryClient {
    pub fn new(publisher: Arc<dyn SnsPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl SnsDeliveryClient for AwsSnsDeliveryClient {
    async fn send(
        &self,
        target: &SnsTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        let region = region_of_topic(&target.topic_arn).ok_or_else(|| {
            DeliveryError::InvalidDestination(format!("Invalid SNS topic ARN: {}", target.topic_arn))
        })?;
        let subject = Some(message.title.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let request = SnsPublishRequest {
            region: region.to_string(),
            topic_arn: target.topic_arn.clone(),
            role_arn: target.role_arn.clone(),
            subject,
            message: message.text_description.clone(),
        };

        let status = match self.publisher.publish(&request).await {
            Ok(message_id) => {
                tracing::info!(topic_arn = %target.topic_arn, message_id = %message_id, "sns message published");
                DeliveryStatus::new("200", format!("Success:{}", message_id))
            }
            Err(SnsFailure::Service { code, message }) => {
                tracing::warn!(topic_arn = %target.topic_arn, code = %code, "sns publish rejected");
                DeliveryStatus::new(
                    status_of_error_code(&code),
                    format!("SNS Send Error, SNS status:{}:{}", code, message),
                )
            }
            Err(SnsFailure::Sdk(e)) => {
                tracing::warn!(topic_arn = %target.topic_arn, error = %e, "sns publish failed");
                DeliveryStatus::new("424", format!("SNS sdk Error, SDK status:{}", e))
            }
        };
        Ok(status)
    }
}
