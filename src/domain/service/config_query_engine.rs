use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::entity::channel_config::ChannelConfig;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::config_query::{
    ConfigPage, ConfigQuery, ConfigQueryRequest, FieldFilter, FieldKind, FieldMatch, FieldRef,
    FreeTextQuery, FreeTextScope, SortOrder, SortValue, TextPattern, DEFAULT_MAX_ITEMS,
    MAX_ITEMS_LIMIT,
};
use crate::domain::entity::feature::Feature;
use crate::domain::service::channel_registry::ChannelRegistry;
use crate::domain::service::channel_validation::ConfigError;

const QUERY_PARAM: &str = "query";
const TEXT_QUERY_PARAM: &str = "text_query";
/// テキスト系フィールドの値全体での完全一致を指定するサフィックス。
const KEYWORD_SUFFIX: &str = ".keyword";

/// ConfigQueryEngine は汎用クエリを型付きクエリに変換し、設定一覧に対して評価する。
///
/// フィールド名の解決はすべてレジストリ経由で行い、種別ごとの分岐を持たない。
pub struct ConfigQueryEngine {
    registry: Arc<ChannelRegistry>,
}

impl ConfigQueryEngine {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    pub fn build(&self, request: &ConfigQueryRequest) -> Result<ConfigQuery, ConfigError> {
        let mut filters = Vec::new();
        let mut free_text = Vec::new();

        for (key, value) in &request.filter_params {
            match key.as_str() {
                QUERY_PARAM => free_text.push(FreeTextQuery {
                    scope: FreeTextScope::AllFields,
                    pattern: parse_pattern(value)?,
                }),
                TEXT_QUERY_PARAM => free_text.push(FreeTextQuery {
                    scope: FreeTextScope::TextFields,
                    pattern: parse_pattern(value)?,
                }),
                _ => {
                    let (field, kind) = self.resolve_field(key).ok_or_else(|| {
                        ConfigError::NotAcceptable(format!("Query on {} not acceptable", key))
                    })?;
                    let condition = condition_for(&field, kind, value)?;
                    filters.push(FieldFilter { field, condition });
                }
            }
        }

        let sort_field = match &request.sort_field {
            None => FieldRef::CreatedTimeMs,
            Some(name) => match self.resolve_field(name) {
                Some((_, FieldKind::NestedText)) | None => {
                    return Err(ConfigError::NotAcceptable(format!(
                        "Sort on {} not acceptable",
                        name
                    )))
                }
                Some((field, _)) => field,
            },
        };

        let max_items = request.max_items.unwrap_or(DEFAULT_MAX_ITEMS);
        if max_items > MAX_ITEMS_LIMIT {
            return Err(ConfigError::invalid(format!(
                "max_items must be at most {}",
                MAX_ITEMS_LIMIT
            )));
        }

        Ok(ConfigQuery {
            filters,
            free_text,
            sort_field,
            sort_order: request.sort_order.unwrap_or_default(),
            from_index: request.from_index.unwrap_or(0),
            max_items,
        })
    }

    /// フィルタ・ソート・ページングを順に適用する。総件数はページング前の件数。
    pub fn execute(&self, query: &ConfigQuery, configs: Vec<ChannelConfig>) -> ConfigPage {
        let hits: Vec<ChannelConfig> = configs
            .into_iter()
            .filter(|doc| self.matches(query, doc))
            .collect();
        let total_hits = hits.len();

        let mut keyed: Vec<(Option<SortValue>, ChannelConfig)> = hits
            .into_iter()
            .map(|doc| (self.sort_value(&query.sort_field, query.sort_order, &doc), doc))
            .collect();
        keyed.sort_by(|(ka, a), (kb, b)| compare(ka, kb, query.sort_order, &a.config_id, &b.config_id));

        let configs = keyed
            .into_iter()
            .map(|(_, doc)| doc)
            .skip(query.from_index)
            .take(query.max_items)
            .collect();
        ConfigPage {
            total_hits,
            configs,
        }
    }

    fn resolve_field(&self, name: &str) -> Option<(FieldRef, FieldKind)> {
        match name.strip_suffix(KEYWORD_SUFFIX) {
            Some(base) => match self.resolve_base_field(base)? {
                (field, FieldKind::Text | FieldKind::NestedText) => Some((field, FieldKind::Keyword)),
                (_, FieldKind::Keyword) => None,
            },
            None => self.resolve_base_field(name),
        }
    }

    fn resolve_base_field(&self, name: &str) -> Option<(FieldRef, FieldKind)> {
        let common = match name {
            "name" => Some((FieldRef::Name, FieldKind::Text)),
            "description" => Some((FieldRef::Description, FieldKind::Text)),
            "config_type" => Some((FieldRef::ConfigType, FieldKind::Keyword)),
            "feature_list" => Some((FieldRef::FeatureList, FieldKind::Keyword)),
            "is_enabled" => Some((FieldRef::IsEnabled, FieldKind::Keyword)),
            "created_time_ms" => Some((FieldRef::CreatedTimeMs, FieldKind::Keyword)),
            "last_updated_time_ms" => Some((FieldRef::LastUpdatedTimeMs, FieldKind::Keyword)),
            _ => None,
        };
        if common.is_some() {
            return common;
        }

        let (tag, path) = name.split_once('.')?;
        let config_type = ChannelType::from_tag(tag)?;
        self.registry
            .descriptor(config_type)
            .fields()
            .iter()
            .find(|f| f.path == path)
            .map(|f| {
                (
                    FieldRef::Payload {
                        config_type,
                        path: f.path,
                    },
                    f.kind,
                )
            })
    }

    fn matches(&self, query: &ConfigQuery, doc: &ChannelConfig) -> bool {
        query.filters.iter().all(|f| self.filter_matches(f, doc))
            && query
                .free_text
                .iter()
                .all(|q| self.text_values(q.scope, doc).iter().any(|v| q.pattern.matches(v)))
    }

    fn filter_matches(&self, filter: &FieldFilter, doc: &ChannelConfig) -> bool {
        match &filter.condition {
            FieldMatch::Range { from, to } => self
                .int_value(&filter.field, doc)
                .is_some_and(|v| *from <= v && v <= *to),
            FieldMatch::Exact(expected) => self.int_value(&filter.field, doc) == Some(*expected),
            FieldMatch::Terms(expected) => self
                .string_values(&filter.field, doc)
                .iter()
                .any(|v| expected.contains(v)),
            FieldMatch::Text(pattern) => self
                .string_values(&filter.field, doc)
                .iter()
                .any(|v| pattern.matches(v)),
        }
    }

    fn int_value(&self, field: &FieldRef, doc: &ChannelConfig) -> Option<i64> {
        match field {
            FieldRef::CreatedTimeMs => Some(doc.created_time_ms()),
            FieldRef::LastUpdatedTimeMs => Some(doc.last_updated_time_ms()),
            _ => None,
        }
    }

    fn string_values(&self, field: &FieldRef, doc: &ChannelConfig) -> Vec<String> {
        let config = &doc.config;
        match field {
            FieldRef::Name => vec![config.name.clone()],
            FieldRef::Description => vec![config.description.clone()],
            FieldRef::ConfigType => vec![config.config_type().tag().to_string()],
            FieldRef::FeatureList => config
                .feature_list
                .iter()
                .map(|f| f.tag().to_string())
                .collect(),
            FieldRef::IsEnabled => vec![config.is_enabled.to_string()],
            FieldRef::CreatedTimeMs => vec![doc.created_time_ms().to_string()],
            FieldRef::LastUpdatedTimeMs => vec![doc.last_updated_time_ms().to_string()],
            FieldRef::Payload { config_type, path } => {
                if doc.config_type() != *config_type {
                    return Vec::new();
                }
                self.registry
                    .descriptor(*config_type)
                    .field_values(&config.payload, path)
                    .unwrap_or_default()
            }
        }
    }

    fn text_values(&self, scope: FreeTextScope, doc: &ChannelConfig) -> Vec<String> {
        let config = &doc.config;
        let mut values = vec![config.name.clone(), config.description.clone()];
        if scope == FreeTextScope::AllFields {
            values.push(config.config_type().tag().to_string());
            values.extend(config.feature_list.iter().map(|f| f.tag().to_string()));
        }
        let descriptor = self.registry.descriptor(doc.config_type());
        for field in descriptor.fields() {
            if scope == FreeTextScope::TextFields && field.kind == FieldKind::Keyword {
                continue;
            }
            values.extend(
                descriptor
                    .field_values(&config.payload, field.path)
                    .unwrap_or_default(),
            );
        }
        values
    }

    fn sort_value(&self, field: &FieldRef, order: SortOrder, doc: &ChannelConfig) -> Option<SortValue> {
        let config = &doc.config;
        match field {
            FieldRef::CreatedTimeMs => Some(SortValue::Int(doc.created_time_ms())),
            FieldRef::LastUpdatedTimeMs => Some(SortValue::Int(doc.last_updated_time_ms())),
            FieldRef::IsEnabled => Some(SortValue::Bool(config.is_enabled)),
            FieldRef::FeatureList => Some(SortValue::Features(
                config.feature_list.iter().copied().collect::<Vec<Feature>>(),
            )),
            _ => {
                let mut values = self.string_values(field, doc);
                values.sort();
                // 多値フィールドは昇順なら最小値、降順なら最大値をキーにする
                let picked = match order {
                    SortOrder::Asc => values.into_iter().next(),
                    SortOrder::Desc => values.into_iter().next_back(),
                };
                picked.map(|v| SortValue::Str(v.to_lowercase()))
            }
        }
    }
}

fn parse_pattern(value: &str) -> Result<TextPattern, ConfigError> {
    TextPattern::parse(value).map_err(|e| ConfigError::invalid(format!("Invalid query {}: {}", value, e)))
}

fn condition_for(field: &FieldRef, kind: FieldKind, value: &str) -> Result<FieldMatch, ConfigError> {
    match field {
        FieldRef::CreatedTimeMs | FieldRef::LastUpdatedTimeMs => parse_range(value),
        FieldRef::IsEnabled => {
            let flags = value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| {
                    v.parse::<bool>().map(|flag| flag.to_string()).map_err(|_| {
                        ConfigError::invalid(format!("is_enabled must be true or false, got {}", value))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if flags.is_empty() {
                return Err(ConfigError::invalid("is_enabled must be true or false"));
            }
            Ok(FieldMatch::Terms(flags))
        }
        _ => match kind {
            FieldKind::Keyword => Ok(FieldMatch::Terms(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            FieldKind::Text | FieldKind::NestedText => Ok(FieldMatch::Text(parse_pattern(value)?)),
        },
    }
}

fn parse_range(value: &str) -> Result<FieldMatch, ConfigError> {
    let invalid = || {
        ConfigError::invalid(format!(
            "Invalid Range format {}, allowed format 'exact' or 'from..to'",
            value
        ))
    };
    match value.split_once("..") {
        Some((from, to)) => {
            let from = parse_bound(from, i64::MIN).ok_or_else(invalid)?;
            let to = parse_bound(to, i64::MAX).ok_or_else(invalid)?;
            Ok(FieldMatch::Range { from, to })
        }
        None => value
            .trim()
            .parse()
            .map(FieldMatch::Exact)
            .map_err(|_| invalid()),
    }
}

fn parse_bound(raw: &str, open: i64) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        Some(open)
    } else {
        raw.parse().ok()
    }
}

/// 値を持たない設定は順序に関係なく末尾。同値は config_id で並べる。
fn compare(
    a: &Option<SortValue>,
    b: &Option<SortValue>,
    order: SortOrder,
    id_a: &str,
    id_b: &str,
) -> Ordering {
    let primary = match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let ordering = primary.then_with(|| id_a.cmp(id_b));
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}
