use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use crate::domain::entity::channel_payload::ChannelPayload;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::feature::Feature;

/// NotificationConfig は利用者が登録するチャネル設定本体を表す。
///
/// 種別タグはペイロードから導出するため、タグとペイロードが食い違う状態は表現できない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub name: String,
    pub description: String,
    pub feature_list: BTreeSet<Feature>,
    pub is_enabled: bool,
    pub payload: ChannelPayload,
}

impl NotificationConfig {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        feature_list: impl IntoIterator<Item = Feature>,
        is_enabled: bool,
        payload: ChannelPayload,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            feature_list: feature_list.into_iter().collect(),
            is_enabled,
            payload,
        }
    }

    pub fn config_type(&self) -> ChannelType {
        self.payload.channel_type()
    }
}

/// ChannelConfig は ID とサーバー付与のタイムスタンプを持つ永続化単位を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub config_id: String,
    pub config: NotificationConfig,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl ChannelConfig {
    pub fn new(config_id: impl Into<String>, config: NotificationConfig) -> Self {
        // 永続化形式がミリ秒精度のため、生成時点で丸めておく
        let now = Utc::now().trunc_subsecs(3);
        Self::with_times(config_id, config, now, now)
    }

    pub fn with_times(
        config_id: impl Into<String>,
        config: NotificationConfig,
        created_time: DateTime<Utc>,
        last_updated_time: DateTime<Utc>,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            config,
            created_time,
            last_updated_time,
        }
    }

    /// 全置換による更新。作成日時は引き継ぐ。
    pub fn replaced_by(&self, config: NotificationConfig) -> Self {
        Self {
            config_id: self.config_id.clone(),
            config,
            created_time: self.created_time,
            last_updated_time: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn config_type(&self) -> ChannelType {
        self.config.config_type()
    }

    pub fn created_time_ms(&self) -> i64 {
        self.created_time.timestamp_millis()
    }

    pub fn last_updated_time_ms(&self) -> i64 {
        self.last_updated_time.timestamp_millis()
    }

    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            config_id: self.config_id.clone(),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            config_type: self.config_type(),
            is_enabled: self.config.is_enabled,
        }
    }
}

/// ChannelSummary はチャネル一覧用の要約を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub config_id: String,
    pub name: String,
    pub description: String,
    pub config_type: ChannelType,
    pub is_enabled: bool,
}
