use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::entity::channel_config::{ChannelConfig, NotificationConfig};
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::feature::Feature;
use crate::domain::service::channel_descriptor::{ChannelDescriptor, UnsupportedDescriptor};
use crate::domain::service::channel_kinds::standard_descriptors;
use crate::domain::service::channel_validation::{require_non_empty, ConfigError};

const NAME_TAG: &str = "name";
const DESCRIPTION_TAG: &str = "description";
const CONFIG_TYPE_TAG: &str = "config_type";
const FEATURE_LIST_TAG: &str = "feature_list";
const IS_ENABLED_TAG: &str = "is_enabled";
const CONFIG_ID_TAG: &str = "config_id";
const CONFIG_TAG: &str = "config";
const CREATED_TIME_TAG: &str = "created_time_ms";
const UPDATED_TIME_TAG: &str = "last_updated_time_ms";

/// ChannelRegistry は種別タグから記述子を引く不変テーブル。起動時に一度だけ構築する。
pub struct ChannelRegistry {
    descriptors: HashMap<ChannelType, Arc<dyn ChannelDescriptor>>,
    unsupported: Arc<dyn ChannelDescriptor>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::with_descriptors(standard_descriptors())
    }

    pub fn with_descriptors(descriptors: Vec<Arc<dyn ChannelDescriptor>>) -> Self {
        let unsupported: Arc<dyn ChannelDescriptor> = Arc::new(UnsupportedDescriptor);
        let mut table = HashMap::new();
        table.insert(ChannelType::None, unsupported.clone());
        for descriptor in descriptors {
            table.insert(descriptor.channel_type(), descriptor);
        }
        Self {
            descriptors: table,
            unsupported,
        }
    }

    /// 種別タグから記述子を解決する。未知のタグは NotFound、`none` は番兵を返す。
    pub fn resolve(&self, tag: &str) -> Result<&dyn ChannelDescriptor, ConfigError> {
        ChannelType::from_tag(tag)
            .and_then(|t| self.descriptors.get(&t))
            .map(AsRef::as_ref)
            .ok_or_else(|| ConfigError::NotFound(format!("Config type {} not found", tag)))
    }

    /// 登録済みでない種別には番兵を返す。
    pub fn descriptor(&self, channel_type: ChannelType) -> &dyn ChannelDescriptor {
        self.descriptors
            .get(&channel_type)
            .unwrap_or(&self.unsupported)
            .as_ref()
    }

    pub fn supported_types(&self) -> Vec<ChannelType> {
        let mut types: Vec<ChannelType> = self
            .descriptors
            .keys()
            .copied()
            .filter(|t| *t != ChannelType::None)
            .collect();
        types.sort();
        types
    }

    /// 送信可能な（トランスポート系統を持つ）種別。
    pub fn sendable_types(&self) -> Vec<ChannelType> {
        self.supported_types()
            .into_iter()
            .filter(|t| self.descriptor(*t).delivery_family().is_some())
            .collect()
    }

    /// 型なし JSON から設定を構築する。種別ペイロードはちょうど 1 つでなければならない。
    pub fn parse_config(&self, value: &Value) -> Result<NotificationConfig, ConfigError> {
        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::invalid("config must be a JSON object"))?;

        let name = string_field(object, NAME_TAG)?.unwrap_or_default();
        require_non_empty(NAME_TAG, &name)?;
        let description = string_field(object, DESCRIPTION_TAG)?.unwrap_or_default();

        let type_tag = string_field(object, CONFIG_TYPE_TAG)?
            .ok_or_else(|| ConfigError::invalid("config_type is null or empty"))?;
        let config_type = ChannelType::from_tag(&type_tag)
            .ok_or_else(|| ConfigError::invalid(format!("Invalid config type {}", type_tag)))?;
        if config_type == ChannelType::None {
            return Err(ConfigError::NotAcceptable(
                "NotificationConfig with type NONE is not acceptable".to_string(),
            ));
        }

        let feature_list = parse_features(object.get(FEATURE_LIST_TAG))?;
        let is_enabled = match object.get(IS_ENABLED_TAG) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(ConfigError::invalid(format!(
                    "is_enabled must be a boolean, got {}",
                    other
                )))
            }
        };

        let mut payload_keys = Vec::new();
        for key in object.keys() {
            match key.as_str() {
                NAME_TAG | DESCRIPTION_TAG | CONFIG_TYPE_TAG | FEATURE_LIST_TAG | IS_ENABLED_TAG => {}
                other if ChannelType::from_tag(other).is_some() => payload_keys.push(other),
                other => return Err(ConfigError::invalid(format!("Unknown field {}", other))),
            }
        }
        if payload_keys.len() > 1 {
            return Err(ConfigError::invalid(format!(
                "Multiple channel payloads supplied: {}",
                payload_keys.join(", ")
            )));
        }
        let payload_key = payload_keys.first().copied().ok_or_else(|| {
            ConfigError::invalid(format!("{} config is missing", config_type))
        })?;
        if payload_key != config_type.tag() {
            return Err(ConfigError::invalid(format!(
                "config_type {} does not match supplied {} config",
                config_type, payload_key
            )));
        }

        let fields = object
            .get(payload_key)
            .and_then(Value::as_object)
            .ok_or_else(|| ConfigError::invalid(format!("{} config must be an object", payload_key)))?;
        let payload = self.descriptor(config_type).construct(fields)?;

        Ok(NotificationConfig {
            name,
            description,
            feature_list,
            is_enabled,
            payload,
        })
    }

    pub fn config_to_json(&self, config: &NotificationConfig) -> Result<Value, ConfigError> {
        let config_type = config.config_type();
        let payload = self.descriptor(config_type).serialize(&config.payload)?;
        let mut object = Map::new();
        object.insert(NAME_TAG.to_string(), Value::String(config.name.clone()));
        object.insert(
            DESCRIPTION_TAG.to_string(),
            Value::String(config.description.clone()),
        );
        object.insert(
            CONFIG_TYPE_TAG.to_string(),
            Value::String(config_type.tag().to_string()),
        );
        object.insert(
            FEATURE_LIST_TAG.to_string(),
            Value::Array(
                config
                    .feature_list
                    .iter()
                    .map(|f| Value::String(f.tag().to_string()))
                    .collect(),
            ),
        );
        object.insert(IS_ENABLED_TAG.to_string(), Value::Bool(config.is_enabled));
        object.insert(config_type.tag().to_string(), payload);
        Ok(Value::Object(object))
    }

    /// 永続化形式（ID・タイムスタンプ付き）へ変換する。
    pub fn document_to_json(&self, doc: &ChannelConfig) -> Result<Value, ConfigError> {
        let mut object = Map::new();
        object.insert(CONFIG_ID_TAG.to_string(), Value::String(doc.config_id.clone()));
        object.insert(CREATED_TIME_TAG.to_string(), Value::from(doc.created_time_ms()));
        object.insert(
            UPDATED_TIME_TAG.to_string(),
            Value::from(doc.last_updated_time_ms()),
        );
        object.insert(CONFIG_TAG.to_string(), self.config_to_json(&doc.config)?);
        Ok(Value::Object(object))
    }

    pub fn document_from_json(&self, value: &Value) -> Result<ChannelConfig, ConfigError> {
        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::invalid("document must be a JSON object"))?;
        let config_id = string_field(object, CONFIG_ID_TAG)?
            .ok_or_else(|| ConfigError::invalid("config_id is null or empty"))?;
        require_non_empty(CONFIG_ID_TAG, &config_id)?;
        let created_time = time_field(object, CREATED_TIME_TAG)?;
        let last_updated_time = time_field(object, UPDATED_TIME_TAG)?;
        let config = object
            .get(CONFIG_TAG)
            .ok_or_else(|| ConfigError::invalid("config is missing"))?;
        Ok(ChannelConfig::with_times(
            config_id,
            self.parse_config(config)?,
            created_time,
            last_updated_time,
        ))
    }

    pub fn document_to_bytes(&self, doc: &ChannelConfig) -> Result<Vec<u8>, ConfigError> {
        let value = self.document_to_json(doc)?;
        serde_json::to_vec(&value).map_err(|e| ConfigError::invalid(e.to_string()))
    }

    pub fn document_from_bytes(&self, bytes: &[u8]) -> Result<ChannelConfig, ConfigError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::invalid(e.to_string()))?;
        self.document_from_json(&value)
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Result<Option<String>, ConfigError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::invalid(format!(
            "{} must be a string, got {}",
            key, other
        ))),
    }
}

fn time_field(object: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, ConfigError> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| ConfigError::invalid(format!("{} is missing or invalid", key)))
}

fn parse_features(value: Option<&Value>) -> Result<BTreeSet<Feature>, ConfigError> {
    let Some(value) = value else {
        return Ok(BTreeSet::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| ConfigError::invalid("feature_list must be an array"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(Feature::from_tag)
                .ok_or_else(|| ConfigError::invalid(format!("Invalid feature {}", item)))
        })
        .collect()
}
