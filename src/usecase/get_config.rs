use std::sync::Arc;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum GetConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct GetConfigUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
}

impl GetConfigUseCase {
    pub fn new(repo: Arc<dyn ChannelConfigRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, config_id: &str) -> Result<ChannelConfig, GetConfigError> {
        self.repo
            .find_by_id(config_id)
            .await
            .map_err(|e| GetConfigError::Internal(e.to_string()))?
            .ok_or_else(|| {
                ConfigError::NotFound(format!("NotificationConfig {} not found", config_id)).into()
            })
    }

    /// 要求順で返す。1 件でも欠けていれば NotFound。
    pub async fn execute_many(&self, config_ids: &[String]) -> Result<Vec<ChannelConfig>, GetConfigError> {
        let found = self
            .repo
            .find_many(config_ids)
            .await
            .map_err(|e| GetConfigError::Internal(e.to_string()))?;

        let mut missing = Vec::new();
        let mut ordered = Vec::with_capacity(config_ids.len());
        for id in config_ids {
            match found.iter().find(|doc| &doc.config_id == id) {
                Some(doc) => ordered.push(doc.clone()),
                None => missing.push(id.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::NotFound(format!(
                "Config IDs not found:[{}]",
                missing.join(", ")
            ))
            .into());
        }
        Ok(ordered)
    }
}
