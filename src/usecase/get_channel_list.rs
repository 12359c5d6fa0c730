use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::entity::channel_config::ChannelSummary;
use crate::domain::entity::config_query::{ConfigQueryRequest, MAX_ITEMS_LIMIT};
use crate::domain::entity::feature::Feature;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::{ChannelRegistry, ConfigError, ConfigQueryEngine};

#[derive(Debug, thiserror::Error)]
pub enum GetChannelListError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// GetChannelListUseCase は送信先として選べるチャネルの要約一覧を返す。
pub struct GetChannelListUseCase {
    repo: Arc<dyn ChannelConfigRepository>,
    registry: Arc<ChannelRegistry>,
    engine: Arc<ConfigQueryEngine>,
}

impl GetChannelListUseCase {
    pub fn new(
        repo: Arc<dyn ChannelConfigRepository>,
        registry: Arc<ChannelRegistry>,
        engine: Arc<ConfigQueryEngine>,
    ) -> Self {
        Self {
            repo,
            registry,
            engine,
        }
    }

    pub async fn execute(&self) -> Result<Vec<ChannelSummary>, GetChannelListError> {
        self.search(self.sendable_filter()).await
    }

    /// feature が有効な送信可能チャネルのみ返す。
    pub async fn execute_for_feature(
        &self,
        feature: Feature,
    ) -> Result<Vec<ChannelSummary>, GetChannelListError> {
        let mut filters = self.sendable_filter();
        filters.insert("feature_list".to_string(), feature.tag().to_string());
        filters.insert("is_enabled".to_string(), "true".to_string());
        self.search(filters).await
    }

    fn sendable_filter(&self) -> BTreeMap<String, String> {
        let tags: Vec<&str> = self
            .registry
            .sendable_types()
            .into_iter()
            .map(|t| t.tag())
            .collect();
        BTreeMap::from([("config_type".to_string(), tags.join(","))])
    }

    async fn search(
        &self,
        filter_params: BTreeMap<String, String>,
    ) -> Result<Vec<ChannelSummary>, GetChannelListError> {
        let request = ConfigQueryRequest {
            filter_params,
            max_items: Some(MAX_ITEMS_LIMIT),
            ..Default::default()
        };
        let query = self.engine.build(&request)?;
        let page = self
            .repo
            .search(&query)
            .await
            .map_err(|e| GetChannelListError::Internal(e.to_string()))?;
        Ok(page.configs.iter().map(|doc| doc.summary()).collect())
    }
}
