use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::ConfigError;

pub const DELETE_OK: &str = "OK";

#[derive(Debug, thiserror::Error)]
pub enum DeleteConfigsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// DeleteConfigsUseCase は複数の設定を一括削除する。1 件でも存在しなければ何も削除しない。
pub struct DeleteConfigsUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
}

impl DeleteConfigsUseCase {
    pub fn new(repo: Arc<dyn ChannelConfigRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        config_ids: &[String],
    ) -> Result<BTreeMap<String, String>, DeleteConfigsError> {
        let mut ids: Vec<String> = Vec::with_capacity(config_ids.len());
        for id in config_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        if ids.is_empty() {
            return Err(ConfigError::invalid("config_id_list is null or empty").into());
        }

        let missing = self
            .repo
            .delete_many(&ids)
            .await
            .map_err(|e| DeleteConfigsError::Internal(e.to_string()))?;
        if !missing.is_empty() {
            return Err(ConfigError::NotFound(format!(
                "Config IDs not found:[{}]",
                missing.join(", ")
            ))
            .into());
        }

        tracing::info!(count = ids.len(), "notification configs deleted");
        Ok(ids
            .into_iter()
            .map(|id| (id, DELETE_OK.to_string()))
            .collect())
    }
}
