use std::fmt;

use serde::{Deserialize, Serialize};

/// Feature は設定を利用できるサブシステムを表す。
///
/// 宣言順がそのまま単一 feature の順序になり、feature 集合のソートキーの基礎となる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Alerting,
    IndexManagement,
    Reports,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Alerting, Feature::IndexManagement, Feature::Reports];

    pub fn tag(self) -> &'static str {
        match self {
            Feature::Alerting => "alerting",
            Feature::IndexManagement => "index_management",
            Feature::Reports => "reports",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
