use async_trait::async_trait;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::entity::config_query::{ConfigPage, ConfigQuery};

/// ChannelConfigRepository は設定ストアを表す。ID 単位の操作は原子的であること。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelConfigRepository: Send + Sync {
    async fn find_by_id(&self, config_id: &str) -> anyhow::Result<Option<ChannelConfig>>;

    /// 見つかった分だけ返す。欠落 ID の判定は呼び出し側が行う。
    async fn find_many(&self, config_ids: &[String]) -> anyhow::Result<Vec<ChannelConfig>>;

    async fn find_all(&self) -> anyhow::Result<Vec<ChannelConfig>>;

    /// 同じ ID が既にあれば保存せず `false` を返す。
    async fn create(&self, config: &ChannelConfig) -> anyhow::Result<bool>;

    /// ID が存在しなければ `false` を返す。
    async fn update(&self, config: &ChannelConfig) -> anyhow::Result<bool>;

    /// すべての ID が存在する場合のみまとめて削除する。存在判定と削除は原子的に行う。
    /// 存在しなかった ID を返し、1 件でもあれば何も削除しない。
    async fn delete_many(&self, config_ids: &[String]) -> anyhow::Result<Vec<String>>;

    async fn search(&self, query: &ConfigQuery) -> anyhow::Result<ConfigPage>;
}
