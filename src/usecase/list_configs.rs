use std::sync::Arc;

use crate::domain::entity::config_query::{ConfigPage, ConfigQueryRequest};
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::{ConfigError, ConfigQueryEngine};

#[derive(Debug, thiserror::Error)]
pub enum ListConfigsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ListConfigsUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    engine: Arc<ConfigQueryEngine>,
}

impl ListConfigsUseCase {
    pub fn new(repo: Arc<dyn ChannelConfigRepository>, engine: Arc<ConfigQueryEngine>) -> Self {
        Self { repo, engine }
    }

    pub async fn execute(&self, request: &ConfigQueryRequest) -> Result<ConfigPage, ListConfigsError> {
        let query = self.engine.build(request)?;
        self.repo
            .search(&query)
            .await
            .map_err(|e| ListConfigsError::Internal(e.to_string()))
    }
}
