use std::sync::Arc;

use crate::domain::entity::delivery_result::DeliveryResult;
use crate::domain::entity::message::MessageContent;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::ConfigError;
use crate::usecase::send_message::{SendMessageError, SendMessageInput, SendMessageUseCase};

/// 指定した設定に送る固定のテストメッセージ。
pub fn test_message(config_id: &str) -> MessageContent {
    let text = format!("Test Message for config id {}", config_id);
    MessageContent {
        html_description: Some(format!(
            "<html><header><title>Test Message</title></header><body><p>{}</p></body></html>",
            text
        )),
        ..MessageContent::new(format!("Test Message-{}", config_id), text)
    }
}

/// SendTestMessageUseCase は保存済みの 1 設定へテストメッセージを送り、送信結果を返す。
pub struct SendTestMessageUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    send_message: Arc<SendMessageUseCase>,
}

impl SendTestMessageUseCase {
    pub fn new(repo: Arc<dyn ChannelConfigRepository>, send_message: Arc<SendMessageUseCase>) -> Self {
        Self { repo, send_message }
    }

    pub async fn execute(&self, config_id: &str) -> Result<Vec<DeliveryResult>, SendMessageError> {
        let exists = self
            .repo
            .find_by_id(config_id)
            .await
            .map_err(|e| SendMessageError::Internal(e.to_string()))?
            .is_some();
        if !exists {
            return Err(
                ConfigError::NotFound(format!("NotificationConfig {} not found", config_id)).into(),
            );
        }

        tracing::info!(config_id = %config_id, "sending test message");
        self.send_message
            .execute(&SendMessageInput {
                channel_ids: vec![config_id.to_string()],
                message: test_message(config_id),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::channel_config_repository::MockChannelConfigRepository;
    use crate::domain::service::ChannelRegistry;
    use crate::test_support::stub_transports;
    use crate::usecase::config_validator::tests::email_group;

    fn usecase(mock: MockChannelConfigRepository) -> SendTestMessageUseCase {
        let repo: Arc<dyn ChannelConfigRepository> = Arc::new(mock);
        let send = Arc::new(SendMessageUseCase::new(
            repo.clone(),
            Arc::new(ChannelRegistry::new()),
            stub_transports(),
        ));
        SendTestMessageUseCase::new(repo, send)
    }

    #[test]
    fn test_message_mentions_config_id() {
        let message = test_message("abc");
        assert_eq!(message.title, "Test Message-abc");
        assert_eq!(message.text_description, "Test Message for config id abc");
        assert!(message
            .html_description
            .as_deref()
            .is_some_and(|html| html.contains("<p>Test Message for config id abc</p>")));
        assert!(message.validate().is_ok());
    }

    #[tokio::test]
    async fn missing_config_is_not_found() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));
        mock.expect_find_many().never();

        match usecase(mock).execute("nope").await.unwrap_err() {
            SendMessageError::Config(ConfigError::NotFound(msg)) => {
                assert_eq!(msg, "NotificationConfig nope not found")
            }
            e => unreachable!("unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn dispatches_to_the_single_config() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_find_by_id()
            .returning(|id| Ok(Some(email_group(id, &["x@example.com"]))));
        mock.expect_find_many()
            .withf(|ids| ids.len() == 1 && ids[0] == "g")
            .returning(|ids| Ok(vec![email_group(&ids[0], &["x@example.com"])]));

        let results = usecase(mock).execute("g").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].config_id, "g");
    }

    #[tokio::test]
    async fn repository_failure_is_internal() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_find_by_id()
            .returning(|_| Err(anyhow::anyhow!("db error")));

        assert!(matches!(
            usecase(mock).execute("x").await,
            Err(SendMessageError::Internal(_))
        ));
    }
}
