use async_trait::async_trait;

use crate::domain::entity::delivery_result::DeliveryStatus;
use crate::domain::entity::destination::{SmtpTarget, SnsTarget, WebhookTarget};
use crate::domain::entity::message::MessageContent;

/// DeliveryError は送信前提の違反を表す。
///
/// 送信先からの失敗応答はエラーではなく、非 2xx の `DeliveryStatus` として返す。
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookDeliveryClient: Send + Sync {
    async fn send(
        &self,
        target: &WebhookTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailDeliveryClient: Send + Sync {
    /// 1 宛先分を送る。複数宛先の集約は呼び出し側が行う。
    async fn send(
        &self,
        target: &SmtpTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnsDeliveryClient: Send + Sync {
    async fn send(
        &self,
        target: &SnsTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError>;
}
