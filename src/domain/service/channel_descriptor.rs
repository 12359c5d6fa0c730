use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::entity::channel_payload::ChannelPayload;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::config_query::PayloadField;
use crate::domain::entity::destination::{BodyStyle, WebhookTarget};
use crate::domain::service::channel_validation::ConfigError;

/// DeliveryFamily は送信に使うトランスポートの系統を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFamily {
    Webhook,
    Email,
    Sns,
}

/// ChannelDescriptor は 1 種別分の構築・直列化・検索フィールド・送信先解決をまとめたレジストリ項目。
///
/// 種別ごとの振る舞いはすべてこの trait 経由で取得し、呼び出し側は種別タグで分岐しない。
pub trait ChannelDescriptor: Send + Sync {
    fn channel_type(&self) -> ChannelType;

    /// 送信可能な種別ならトランスポート系統を返す。smtp_account / email_group は `None`。
    fn delivery_family(&self) -> Option<DeliveryFamily>;

    /// 型なしのキー・値マップから種別ペイロードを検証付きで構築する。
    fn construct(&self, fields: &Map<String, Value>) -> Result<ChannelPayload, ConfigError>;

    fn serialize(&self, payload: &ChannelPayload) -> Result<Value, ConfigError>;

    fn deserialize(&self, value: &Value) -> Result<ChannelPayload, ConfigError>;

    fn serialize_bytes(&self, payload: &ChannelPayload) -> Result<Vec<u8>, ConfigError> {
        let value = self.serialize(payload)?;
        serde_json::to_vec(&value).map_err(|e| ConfigError::invalid(e.to_string()))
    }

    fn deserialize_bytes(&self, bytes: &[u8]) -> Result<ChannelPayload, ConfigError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::invalid(e.to_string()))?;
        self.deserialize(&value)
    }

    fn fields(&self) -> &'static [PayloadField];

    /// ペイロード内フィールドの値を文字列で返す。リスト型は要素ごとに返す。
    fn field_values(&self, payload: &ChannelPayload, path: &str) -> Result<Vec<String>, ConfigError>;

    fn webhook_target(&self, payload: &ChannelPayload) -> Result<WebhookTarget, ConfigError>;
}

/// PayloadKind は種別ペイロード型ごとの検証と検索フィールドを表す。
pub trait PayloadKind: Serialize + DeserializeOwned + Send + Sync + 'static {
    const FIELDS: &'static [PayloadField];

    fn validate(&self) -> Result<(), ConfigError>;

    fn field_values(&self, path: &str) -> Vec<String>;

    fn webhook_target(&self, _body_style: BodyStyle) -> Option<WebhookTarget> {
        None
    }
}

/// PayloadDescriptor は PayloadKind を ChannelDescriptor に載せる汎用実装。
pub struct PayloadDescriptor<P> {
    channel_type: ChannelType,
    delivery_family: Option<DeliveryFamily>,
    body_style: BodyStyle,
    wrap: fn(P) -> ChannelPayload,
    unwrap: fn(&ChannelPayload) -> Option<&P>,
}

impl<P: PayloadKind> PayloadDescriptor<P> {
    pub fn new(
        channel_type: ChannelType,
        delivery_family: Option<DeliveryFamily>,
        wrap: fn(P) -> ChannelPayload,
        unwrap: fn(&ChannelPayload) -> Option<&P>,
    ) -> Self {
        Self {
            channel_type,
            delivery_family,
            body_style: BodyStyle::Content,
            wrap,
            unwrap,
        }
    }

    pub fn with_body_style(mut self, body_style: BodyStyle) -> Self {
        self.body_style = body_style;
        self
    }

    fn inner<'a>(&self, payload: &'a ChannelPayload) -> Result<&'a P, ConfigError> {
        (self.unwrap)(payload).ok_or_else(|| {
            ConfigError::invalid(format!(
                "payload of type {} passed to {} descriptor",
                payload.channel_type(),
                self.channel_type
            ))
        })
    }

    fn build(&self, value: Value) -> Result<ChannelPayload, ConfigError> {
        let parsed: P = serde_json::from_value(value).map_err(|e| {
            ConfigError::invalid(format!("Invalid {} config: {}", self.channel_type, e))
        })?;
        parsed.validate()?;
        Ok((self.wrap)(parsed))
    }
}

impl<P: PayloadKind> ChannelDescriptor for PayloadDescriptor<P> {
    fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    fn delivery_family(&self) -> Option<DeliveryFamily> {
        self.delivery_family
    }

    fn construct(&self, fields: &Map<String, Value>) -> Result<ChannelPayload, ConfigError> {
        self.build(Value::Object(fields.clone()))
    }

    fn serialize(&self, payload: &ChannelPayload) -> Result<Value, ConfigError> {
        let inner = self.inner(payload)?;
        serde_json::to_value(inner).map_err(|e| ConfigError::invalid(e.to_string()))
    }

    fn deserialize(&self, value: &Value) -> Result<ChannelPayload, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::invalid(format!(
                "{} config must be an object",
                self.channel_type
            )));
        }
        self.build(value.clone())
    }

    fn fields(&self) -> &'static [PayloadField] {
        P::FIELDS
    }

    fn field_values(&self, payload: &ChannelPayload, path: &str) -> Result<Vec<String>, ConfigError> {
        Ok(self.inner(payload)?.field_values(path))
    }

    fn webhook_target(&self, payload: &ChannelPayload) -> Result<WebhookTarget, ConfigError> {
        self.inner(payload)?
            .webhook_target(self.body_style)
            .ok_or_else(|| {
                ConfigError::UnsupportedOperation(format!(
                    "{} is not a webhook channel",
                    self.channel_type
                ))
            })
    }
}

/// 未対応種別の番兵。データを生成する操作はすべて UnsupportedOperation になる。
pub struct UnsupportedDescriptor;

impl UnsupportedDescriptor {
    fn unsupported<T>(operation: &str) -> Result<T, ConfigError> {
        Err(ConfigError::UnsupportedOperation(format!(
            "{} is not supported for config type none",
            operation
        )))
    }
}

impl ChannelDescriptor for UnsupportedDescriptor {
    fn channel_type(&self) -> ChannelType {
        ChannelType::None
    }

    fn delivery_family(&self) -> Option<DeliveryFamily> {
        None
    }

    fn construct(&self, _fields: &Map<String, Value>) -> Result<ChannelPayload, ConfigError> {
        Self::unsupported("construct")
    }

    fn serialize(&self, _payload: &ChannelPayload) -> Result<Value, ConfigError> {
        Self::unsupported("serialize")
    }

    fn deserialize(&self, _value: &Value) -> Result<ChannelPayload, ConfigError> {
        Self::unsupported("deserialize")
    }

    fn fields(&self) -> &'static [PayloadField] {
        &[]
    }

    fn field_values(&self, _payload: &ChannelPayload, _path: &str) -> Result<Vec<String>, ConfigError> {
        Self::unsupported("field_values")
    }

    fn webhook_target(&self, _payload: &ChannelPayload) -> Result<WebhookTarget, ConfigError> {
        Self::unsupported("webhook_target")
    }
}
