use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::entity::channel_payload::Email;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::delivery_result::{
    DeliveryResult, DeliveryStatus, EmailRecipientStatus, UNKNOWN_RECIPIENT,
};
use crate::domain::entity::destination::{SmtpTarget, SnsTarget};
use crate::domain::entity::message::{MessageContent, MessageError};
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::channel_validation::strip_mailto;
use crate::domain::service::{
    ChannelRegistry, ConfigError, DeliveryError, DeliveryFamily, EmailDeliveryClient,
    SnsDeliveryClient, WebhookDeliveryClient,
};

/// 存在しない ID に対する結果の名前。
pub const INVALID_CONFIG_NAME: &str = "invalid-config";

#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub channel_ids: Vec<String>,
    pub message: MessageContent,
}

#[derive(Debug, thiserror::Error)]
pub enum SendMessageError {
    #[error(transparent)]
    InvalidMessage(#[from] MessageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Transports は送信系統ごとのクライアントをまとめる。
#[derive(Clone)]
pub struct Transports {
    pub webhook: Arc<dyn WebhookDeliveryClient>,
    pub email: Arc<dyn EmailDeliveryClient>,
    pub sns: Arc<dyn SnsDeliveryClient>,
}

/// SendMessageUseCase は複数チャネルへの同時送信と結果の集約を行う。
///
/// 1 チャネルの失敗は他チャネルの送信に影響せず、要求した ID ごとに必ず 1 件の結果を返す。
pub struct SendMessageUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    registry: Arc<ChannelRegistry>,
    transports: Transports,
}

fn not_found_status(config_id: &str) -> DeliveryStatus {
    DeliveryStatus::new("404", format!("Channel {} not found", config_id))
}

fn muted_status() -> DeliveryStatus {
    DeliveryStatus::new("LOCKED", "The channel is muted")
}

fn not_sendable_status() -> DeliveryStatus {
    DeliveryStatus::new("NOT_FOUND", "Channel not found")
}

fn failed_status() -> DeliveryStatus {
    DeliveryStatus::new("424", "Failed to send notification")
}

impl SendMessageUseCase {
    pub fn new(
        repo: Arc<dyn ChannelConfigRepository>,
        registry: Arc<ChannelRegistry>,
        transports: Transports,
    ) -> Self {
        Self {
            repo,
            registry,
            transports,
        }
    }

    pub async fn execute(&self, input: &SendMessageInput) -> Result<Vec<DeliveryResult>, SendMessageError> {
        input.message.validate()?;

        let mut ids: Vec<&String> = Vec::with_capacity(input.channel_ids.len());
        for id in &input.channel_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(ConfigError::invalid("channel_ids is null or empty").into());
        }

        let lookup: Vec<String> = ids.iter().map(|id| (*id).clone()).collect();
        let found: HashMap<String, ChannelConfig> = self
            .repo
            .find_many(&lookup)
            .await
            .map_err(|e| SendMessageError::Internal(e.to_string()))?
            .into_iter()
            .map(|doc| (doc.config_id.clone(), doc))
            .collect();

        let results = join_all(
            ids.iter()
                .map(|id| self.dispatch_one(id, found.get(*id), &input.message)),
        )
        .await;

        let failed = results
            .iter()
            .filter(|r| !r.delivery_status.is_success())
            .count();
        tracing::info!(
            channels = results.len(),
            failed,
            "notification dispatch completed"
        );
        Ok(results)
    }

    async fn dispatch_one(
        &self,
        config_id: &str,
        doc: Option<&ChannelConfig>,
        message: &MessageContent,
    ) -> DeliveryResult {
        let Some(doc) = doc else {
            tracing::warn!(config_id = %config_id, "channel not found");
            return DeliveryResult::single(
                config_id,
                INVALID_CONFIG_NAME,
                ChannelType::None,
                not_found_status(config_id),
            );
        };
        let config_type = doc.config_type();
        let name = doc.config.name.as_str();

        if !doc.config.is_enabled {
            tracing::warn!(config_id = %config_id, "channel is muted");
            return DeliveryResult::single(config_id, name, config_type, muted_status());
        }

        let descriptor = self.registry.descriptor(config_type);
        let status = match descriptor.delivery_family() {
            None => {
                tracing::warn!(config_id = %config_id, config_type = %config_type, "channel type is not sendable");
                not_sendable_status()
            }
            Some(DeliveryFamily::Email) => match doc.config.payload.as_email() {
                Some(email) => return self.send_email(doc, email, message).await,
                None => not_sendable_status(),
            },
            Some(DeliveryFamily::Webhook) => match descriptor.webhook_target(&doc.config.payload) {
                Ok(target) => settle(
                    config_id,
                    self.transports.webhook.send(&target, message).await,
                ),
                Err(e) => {
                    tracing::warn!(config_id = %config_id, error = %e, "webhook target could not be resolved");
                    failed_status()
                }
            },
            Some(DeliveryFamily::Sns) => match doc.config.payload.as_sns() {
                Some(sns) => settle(
                    config_id,
                    self.transports.sns.send(&SnsTarget::from(sns), message).await,
                ),
                None => not_sendable_status(),
            },
        };

        DeliveryResult::single(config_id, name, config_type, status)
    }

    async fn send_email(
        &self,
        doc: &ChannelConfig,
        email: &Email,
        message: &MessageContent,
    ) -> DeliveryResult {
        let config_id = doc.config_id.as_str();
        let mut ids = vec![email.email_account_id.clone()];
        ids.extend(email.email_group_id_list.iter().cloned());

        let referenced = match self.repo.find_many(&ids).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(config_id = %config_id, error = %e, "email references could not be loaded");
                return DeliveryResult::email(config_id, &doc.config.name, vec![], failed_status());
            }
        };

        let mut statuses = Vec::new();
        let mut recipients: Vec<String> = Vec::new();
        let mut add_recipient = |address: &str| {
            let address = strip_mailto(address).to_string();
            if !recipients.contains(&address) {
                recipients.push(address);
            }
        };
        for r in &email.recipient_list {
            add_recipient(&r.recipient);
        }
        for group_id in &email.email_group_id_list {
            let group = referenced
                .iter()
                .find(|d| &d.config_id == group_id)
                .and_then(|d| d.config.payload.as_email_group());
            match group {
                Some(group) => group
                    .recipient_list
                    .iter()
                    .for_each(|r| add_recipient(&r.recipient)),
                None => statuses.push(EmailRecipientStatus::new(
                    UNKNOWN_RECIPIENT,
                    DeliveryStatus::new("404", format!("Recipient {} not found", group_id)),
                )),
            }
        }

        let account = referenced
            .iter()
            .find(|d| d.config_id == email.email_account_id)
            .and_then(|d| d.config.payload.as_smtp_account().map(|acc| (d, acc)));
        let Some((account_doc, account)) = account else {
            let status = DeliveryStatus::new(
                "404",
                format!("Sender {} not found", email.email_account_id),
            );
            tracing::warn!(config_id = %config_id, account_id = %email.email_account_id, "smtp account not found");
            statuses.extend(
                recipients
                    .into_iter()
                    .map(|r| EmailRecipientStatus::new(r, status.clone())),
            );
            return DeliveryResult::email(config_id, &doc.config.name, statuses, status);
        };

        let sends = recipients.into_iter().map(|recipient| {
            let target = SmtpTarget {
                account_id: account_doc.config_id.clone(),
                account_name: account_doc.config.name.clone(),
                account: account.clone(),
                recipient,
            };
            async move {
                let status = settle(config_id, self.transports.email.send(&target, message).await);
                EmailRecipientStatus::new(target.recipient, status)
            }
        });
        statuses.extend(join_all(sends).await);

        DeliveryResult::email(
            config_id,
            &doc.config.name,
            statuses,
            DeliveryStatus::new("404", "No recipients found"),
        )
    }
}

fn settle(config_id: &str, outcome: Result<DeliveryStatus, DeliveryError>) -> DeliveryStatus {
    match outcome {
        Ok(status) => {
            if !status.is_success() {
                tracing::warn!(
                    config_id = %config_id,
                    status_code = %status.status_code,
                    "remote delivery failed"
                );
            }
            status
        }
        Err(e) => {
            tracing::warn!(config_id = %config_id, error = %e, "delivery precondition failed");
            failed_status()
        }
    }
}
