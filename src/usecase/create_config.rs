use std::sync::Arc;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::channel_validation::require_non_empty;
use crate::domain::service::{ChannelRegistry, ConfigError};
use crate::usecase::config_validator::{ConfigValidator, ValidateConfigError};

#[derive(Debug, Clone)]
pub struct CreateConfigInput {
    /// 未指定ならサーバーが UUID を採番する。
    pub config_id: Option<String>,
    pub config: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidateConfigError> for CreateConfigError {
    fn from(err: ValidateConfigError) -> Self {
        match err {
            ValidateConfigError::Rejected(e) => Self::Config(e),
            ValidateConfigError::Internal(msg) => Self::Internal(msg),
        }
    }
}

pub struct CreateConfigUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    registry: Arc<ChannelRegistry>,
    validator: Arc<ConfigValidator>,
}

impl CreateConfigUseCase {
    pub fn new(
        repo: Arc<dyn ChannelConfigRepository>,
        registry: Arc<ChannelRegistry>,
        validator: Arc<ConfigValidator>,
    ) -> Self {
        Self {
            repo,
            registry,
            validator,
        }
    }

    pub async fn execute(&self, input: &CreateConfigInput) -> Result<ChannelConfig, CreateConfigError> {
        let config = self.registry.parse_config(&input.config)?;

        let config_id = match &input.config_id {
            Some(id) => {
                require_non_empty("config_id", id)?;
                id.clone()
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        self.validator.validate(&config).await?;

        let doc = ChannelConfig::new(config_id, config);
        let created = self
            .repo
            .create(&doc)
            .await
            .map_err(|e| CreateConfigError::Internal(e.to_string()))?;
        if !created {
            return Err(ConfigError::Conflict(format!(
                "NotificationConfig {} already exists",
                doc.config_id
            ))
            .into());
        }

        tracing::info!(
            config_id = %doc.config_id,
            config_type = %doc.config_type(),
            "notification config created"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::channel_config_repository::MockChannelConfigRepository;
    use crate::usecase::config_validator::ConfigPolicy;

    fn use_case(mock: MockChannelConfigRepository) -> CreateConfigUseCase {
        let repo: Arc<dyn ChannelConfigRepository> = Arc::new(mock);
        let validator = Arc::new(ConfigValidator::new(repo.clone(), ConfigPolicy::default()));
        CreateConfigUseCase::new(repo, Arc::new(ChannelRegistry::new()), validator)
    }

    fn webhook_input(config_id: Option<&str>) -> CreateConfigInput {
        CreateConfigInput {
            config_id: config_id.map(str::to_string),
            config: serde_json::json!({
                "name": "ops webhook",
                "config_type": "webhook",
                "feature_list": ["alerting"],
                "webhook": {"url": "https://abc/com"}
            }),
        }
    }

    #[tokio::test]
    async fn success_with_generated_id() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create().returning(|_| Ok(true));

        let doc = use_case(mock).execute(&webhook_input(None)).await.unwrap();
        assert!(uuid::Uuid::parse_str(&doc.config_id).is_ok());
        assert_eq!(doc.config.name, "ops webhook");
        assert!(doc.config.is_enabled);
    }

    #[tokio::test]
    async fn success_with_given_id() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create()
            .withf(|doc| doc.config_id == "wh-1")
            .returning(|_| Ok(true));

        let doc = use_case(mock)
            .execute(&webhook_input(Some("wh-1")))
            .await
            .unwrap();
        assert_eq!(doc.config_id, "wh-1");
    }

    #[tokio::test]
    async fn conflict_on_duplicate_id() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create().returning(|_| Ok(false));

        let result = use_case(mock).execute(&webhook_input(Some("wh-1"))).await;
        assert!(matches!(
            result,
            Err(CreateConfigError::Config(ConfigError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn invalid_payload_is_not_persisted() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create().never();

        let input = CreateConfigInput {
            config_id: None,
            config: serde_json::json!({
                "name": "plain http",
                "config_type": "webhook",
                "webhook": {"url": "http://abc/com"}
            }),
        };
        let result = use_case(mock).execute(&input).await;
        assert!(matches!(
            result,
            Err(CreateConfigError::Config(ConfigError::InvalidConfig(_)))
        ));
    }

    #[tokio::test]
    async fn missing_email_references_are_not_persisted() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_find_many().returning(|_| Ok(vec![]));
        mock.expect_create().never();

        let input = CreateConfigInput {
            config_id: None,
            config: serde_json::json!({
                "name": "mail",
                "config_type": "email",
                "email": {"email_account_id": "acc", "email_group_id_list": ["grp"]}
            }),
        };
        match use_case(mock).execute(&input).await.unwrap_err() {
            CreateConfigError::Config(ConfigError::NotFound(msg)) => {
                assert_eq!(msg, "Config IDs not found:[acc, grp]")
            }
            e => unreachable!("unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn empty_id_rejected() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create().never();
        let result = use_case(mock).execute(&webhook_input(Some(" "))).await;
        assert!(matches!(
            result,
            Err(CreateConfigError::Config(ConfigError::InvalidConfig(_)))
        ));
    }

    #[tokio::test]
    async fn internal_error() {
        let mut mock = MockChannelConfigRepository::new();
        mock.expect_create()
            .returning(|_| Err(anyhow::anyhow!("db error")));

        match use_case(mock).execute(&webhook_input(None)).await.unwrap_err() {
            CreateConfigError::Internal(msg) => assert!(msg.contains("db error")),
            e => unreachable!("unexpected error: {:?}", e),
        }
    }
}
