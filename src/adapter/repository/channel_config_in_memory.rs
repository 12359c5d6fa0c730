use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::entity::config_query::{ConfigPage, ConfigQuery};
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::{ChannelRegistry, ConfigQueryEngine};

/// InMemoryChannelConfigRepository はインメモリの設定ストア。
///
/// 設定はレジストリの永続化形式（JSON バイト列）で保持し、読み出しごとに復元する。
pub struct InMemoryChannelConfigRepository {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    registry: Arc<ChannelRegistry>,
    engine: ConfigQueryEngine,
}

impl InMemoryChannelConfigRepository {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            engine: ConfigQueryEngine::new(registry.clone()),
            registry,
        }
    }

    fn encode(&self, config: &ChannelConfig) -> anyhow::Result<Vec<u8>> {
        Ok(self.registry.document_to_bytes(config)?)
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<ChannelConfig> {
        Ok(self.registry.document_from_bytes(bytes)?)
    }
}

#[async_trait]
impl ChannelConfigRepository for InMemoryChannelConfigRepository {
    async fn find_by_id(&self, config_id: &str) -> anyhow::Result<Option<ChannelConfig>> {
        let documents = self.documents.read().await;
        documents
            .get(config_id)
            .map(|bytes| self.decode(bytes))
            .transpose()
    }

    async fn find_many(&self, config_ids: &[String]) -> anyhow::Result<Vec<ChannelConfig>> {
        let documents = self.documents.read().await;
        config_ids
            .iter()
            .filter_map(|id| documents.get(id))
            .map(|bytes| self.decode(bytes))
            .collect()
    }

    async fn find_all(&self) -> anyhow::Result<Vec<ChannelConfig>> {
        let documents = self.documents.read().await;
        documents.values().map(|bytes| self.decode(bytes)).collect()
    }

    async fn create(&self, config: &ChannelConfig) -> anyhow::Result<bool> {
        let encoded = self.encode(config)?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&config.config_id) {
            return Ok(false);
        }
        documents.insert(config.config_id.clone(), encoded);
        Ok(true)
    }

    async fn update(&self, config: &ChannelConfig) -> anyhow::Result<bool> {
        let encoded = self.encode(config)?;
        let mut documents = self.documents.write().await;
        match documents.get_mut(&config.config_id) {
            Some(slot) => {
                *slot = encoded;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, config_ids: &[String]) -> anyhow::Result<Vec<String>> {
        let mut documents = self.documents.write().await;
        let missing: Vec<String> = config_ids
            .iter()
            .filter(|id| !documents.contains_key(id.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            for id in config_ids {
                documents.remove(id.as_str());
            }
        }
        Ok(missing)
    }

    async fn search(&self, query: &ConfigQuery) -> anyhow::Result<ConfigPage> {
        let all = self.find_all().await?;
        Ok(self.engine.execute(query, all))
    }
}
