use std::sync::Arc;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::{ChannelRegistry, ConfigError};
use crate::usecase::config_validator::{ConfigValidator, ValidateConfigError};

#[derive(Debug, Clone)]
pub struct UpdateConfigInput {
    pub config_id: String,
    pub config: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidateConfigError> for UpdateConfigError {
    fn from(err: ValidateConfigError) -> Self {
        match err {
            ValidateConfigError::Rejected(e) => Self::Config(e),
            ValidateConfigError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// UpdateConfigUseCase は設定を全置換で更新する。種別の変更は許可しない。
pub struct UpdateConfigUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    registry: Arc<ChannelRegistry>,
    validator: Arc<ConfigValidator>,
}

impl UpdateConfigUseCase {
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

    pub async fn execute(&self, input: &UpdateConfigInput) -> Result<ChannelConfig, UpdateConfigError> {
        let config = self.registry.parse_config(&input.config)?;

        let existing = self
            .repo
            .find_by_id(&input.config_id)
            .await
            .map_err(|e| UpdateConfigError::Internal(e.to_string()))?
            .ok_or_else(|| {
                ConfigError::NotFound(format!("NotificationConfig {} not found", input.config_id))
            })?;

        if existing.config_type() != config.config_type() {
            return Err(ConfigError::Conflict(format!(
                "Config type for NotificationConfig {} cannot be changed from {} to {}",
                input.config_id,
                existing.config_type(),
                config.config_type()
            ))
            .into());
        }

        self.validator.validate(&config).await?;

        let updated = existing.replaced_by(config);
        let stored = self
            .repo
            .update(&updated)
            .await
            .map_err(|e| UpdateConfigError::Internal(e.to_string()))?;
        if !stored {
            return Err(ConfigError::NotFound(format!(
                "NotificationConfig {} not found",
                input.config_id
            ))
            .into());
        }

        tracing::info!(config_id = %updated.config_id, "notification config updated");
        Ok(updated)
    }
}
