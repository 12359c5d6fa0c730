use std::collections::BTreeMap;

use serde::Serialize;

use crate::usecase::config_validator::ConfigPolicy;

pub const TOOLTIP_SUPPORT: &str = "tooltip_support";

/// PluginFeatures は呼び出し元が利用できる設定種別と機能フラグ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginFeatures {
    pub allowed_config_type_list: Vec<String>,
    pub plugin_features: BTreeMap<String, String>,
}

/// GetPluginFeaturesUseCase は受付中の設定種別と機能フラグを返す。
pub struct GetPluginFeaturesUseCase {
    policy: ConfigPolicy,
    tooltip_support: bool,
}

impl GetPluginFeaturesUseCase {
    pub fn new(policy: ConfigPolicy, tooltip_support: bool) -> Self {
        Self {
            policy,
            tooltip_support,
        }
    }

    pub fn execute(&self) -> PluginFeatures {
        PluginFeatures {
            allowed_config_type_list: self
                .policy
                .allowed_config_types
                .iter()
                .map(|t| t.tag().to_string())
                .collect(),
            plugin_features: BTreeMap::from([(
                TOOLTIP_SUPPORT.to_string(),
                self.tooltip_support.to_string(),
            )]),
        }
    }
}
