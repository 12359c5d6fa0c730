use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::feature::Feature;

/// 1 ページの既定件数。
pub const DEFAULT_MAX_ITEMS: usize = 100;
/// 1 ページの上限件数。
pub const MAX_ITEMS_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// FieldKind はペイロード内フィールドの照合方法を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 完全一致（カンマ区切りは OR）
    Keyword,
    /// 部分一致
    Text,
    /// リスト要素内の部分一致（ソート不可）
    NestedText,
}

/// PayloadField は種別ペイロードの検索可能フィールドを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadField {
    pub path: &'static str,
    pub kind: FieldKind,
}

impl PayloadField {
    pub const fn keyword(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Keyword,
        }
    }

    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Text,
        }
    }

    pub const fn nested_text(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::NestedText,
        }
    }
}

/// FieldRef は検索・ソート対象として解決済みのフィールドを表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Name,
    Description,
    ConfigType,
    FeatureList,
    IsEnabled,
    CreatedTimeMs,
    LastUpdatedTimeMs,
    /// `slack.url` のような種別固有フィールド。所有種別に一致する設定だけが値を持つ。
    Payload {
        config_type: ChannelType,
        path: &'static str,
    },
}

/// TextPattern は空白区切りの語のいずれかが含まれるかを判定する。`*` はワイルドカード。
#[derive(Debug, Clone)]
pub struct TextPattern {
    terms: Vec<TermPattern>,
}

#[derive(Debug, Clone)]
enum TermPattern {
    Contains(String),
    Wildcard(Regex),
}

impl TextPattern {
    pub fn parse(input: &str) -> Result<Self, regex::Error> {
        let mut terms = Vec::new();
        for raw in input.split_whitespace() {
            let term = raw.to_lowercase();
            if term.contains('*') {
                let pattern = term
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                terms.push(TermPattern::Wildcard(Regex::new(&pattern)?));
            } else {
                terms.push(TermPattern::Contains(term));
            }
        }
        Ok(Self { terms })
    }

    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.terms.iter().any(|term| match term {
            TermPattern::Contains(t) => value.contains(t.as_str()),
            TermPattern::Wildcard(re) => re.is_match(&value),
        })
    }
}

/// FieldMatch はフィールド値に対する条件を表す。
#[derive(Debug, Clone)]
pub enum FieldMatch {
    /// いずれかの値と完全一致
    Terms(Vec<String>),
    Text(TextPattern),
    /// 両端を含む範囲
    Range { from: i64, to: i64 },
    Exact(i64),
}

#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: FieldRef,
    pub condition: FieldMatch,
}

/// FreeTextScope は `query` / `text_query` の走査範囲を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeTextScope {
    /// 共通フィールドとペイロードの全フィールド
    AllFields,
    /// name / description 相当のテキストフィールドのみ
    TextFields,
}

#[derive(Debug, Clone)]
pub struct FreeTextQuery {
    pub scope: FreeTextScope,
    pub pattern: TextPattern,
}

/// ConfigQueryRequest はクエリエンジンへの汎用リクエスト（未解決のフィールド名）を表す。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigQueryRequest {
    pub filter_params: BTreeMap<String, String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub from_index: Option<usize>,
    pub max_items: Option<usize>,
}

/// ConfigQuery は設定ストアに渡す型付きクエリを表す。
#[derive(Debug, Clone)]
pub struct ConfigQuery {
    pub filters: Vec<FieldFilter>,
    pub free_text: Vec<FreeTextQuery>,
    pub sort_field: FieldRef,
    pub sort_order: SortOrder,
    pub from_index: usize,
    pub max_items: usize,
}

/// SortValue はソートキーを表す。同一フィールド内では常に同じバリアントになる。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Int(i64),
    Bool(bool),
    Str(String),
    /// feature 集合。ソート済みの feature 列を辞書式に比較する。
    Features(Vec<Feature>),
}

#[derive(Debug, Clone)]
pub struct ConfigPage {
    pub total_hits: usize,
    pub configs: Vec<ChannelConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_pattern_contains_any_term() {
        let p = TextPattern::parse("Ops alerts").unwrap();
        assert!(p.matches("daily OPS channel"));
        assert!(p.matches("alerts"));
        assert!(!p.matches("reports"));
    }

    #[test]
    fn test_text_pattern_wildcard() {
        let p = TextPattern::parse("hooks.*.com").unwrap();
        assert!(p.matches("https://hooks.slack.com/services/x"));
        assert!(!p.matches("https://example.org"));
    }

    #[test]
    fn test_feature_set_order() {
        let a = SortValue::Features(vec![Feature::Alerting, Feature::Reports]);
        let b = SortValue::Features(vec![Feature::IndexManagement]);
        let c = SortValue::Features(vec![Feature::Alerting]);
        assert!(c < a);
        assert!(a < b);
    }
}
