use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entity::channel_type::ChannelType;

/// Slack の incoming webhook 設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slack {
    pub url: String,
}

/// Amazon Chime の incoming webhook 設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chime {
    pub url: String,
}

/// Microsoft Teams の incoming webhook 設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicrosoftTeams {
    pub url: String,
}

/// Webhook は汎用 webhook（`webhook` / `custom_webhook`）の設定を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Webhook {
    pub url: String,
    #[serde(default)]
    pub header_params: BTreeMap<String, String>,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "POST".to_string()
}

/// SmtpMethod は SMTP 接続時の暗号化方式を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpMethod {
    None,
    Ssl,
    StartTls,
}

impl SmtpMethod {
    pub fn tag(self) -> &'static str {
        match self {
            SmtpMethod::None => "none",
            SmtpMethod::Ssl => "ssl",
            SmtpMethod::StartTls => "start_tls",
        }
    }
}

impl fmt::Display for SmtpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// SmtpAccount は送信元 SMTP サーバーの設定を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpAccount {
    pub host: String,
    pub port: u16,
    pub method: SmtpMethod,
    pub from_address: String,
}

/// EmailRecipient はメール宛先 1 件を表す。
///
/// 入力は `{"recipient": "a@b.c"}` と素の文字列の両方を受け付け、出力は常にオブジェクト形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecipientRepr")]
pub struct EmailRecipient {
    pub recipient: String,
}

impl EmailRecipient {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientRepr {
    Plain(String),
    Object { recipient: String },
}

impl From<RecipientRepr> for EmailRecipient {
    fn from(repr: RecipientRepr) -> Self {
        match repr {
            RecipientRepr::Plain(recipient) | RecipientRepr::Object { recipient } => {
                Self { recipient }
            }
        }
    }
}

/// Email は SmtpAccount と EmailGroup を参照するメールチャネルの設定を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Email {
    pub email_account_id: String,
    #[serde(default)]
    pub recipient_list: Vec<EmailRecipient>,
    #[serde(default)]
    pub email_group_id_list: Vec<String>,
}

/// EmailGroup は複数の Email 設定から共有される宛先リストを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailGroup {
    pub recipient_list: Vec<EmailRecipient>,
}

/// Sns は Amazon SNS トピックへの発行設定を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sns {
    pub topic_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

/// ChannelPayload は種別固有の設定ブロックを表す。1 つの設定はちょうど 1 つを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPayload {
    Slack(Slack),
    Chime(Chime),
    MicrosoftTeams(MicrosoftTeams),
    Webhook(Webhook),
    CustomWebhook(Webhook),
    SmtpAccount(SmtpAccount),
    Email(Email),
    EmailGroup(EmailGroup),
    Sns(Sns),
}

impl ChannelPayload {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelPayload::Slack(_) => ChannelType::Slack,
            ChannelPayload::Chime(_) => ChannelType::Chime,
            ChannelPayload::MicrosoftTeams(_) => ChannelType::MicrosoftTeams,
            ChannelPayload::Webhook(_) => ChannelType::Webhook,
            ChannelPayload::CustomWebhook(_) => ChannelType::CustomWebhook,
            ChannelPayload::SmtpAccount(_) => ChannelType::SmtpAccount,
            ChannelPayload::Email(_) => ChannelType::Email,
            ChannelPayload::EmailGroup(_) => ChannelType::EmailGroup,
            ChannelPayload::Sns(_) => ChannelType::Sns,
        }
    }

    pub fn as_smtp_account(&self) -> Option<&SmtpAccount> {
        match self {
            ChannelPayload::SmtpAccount(account) => Some(account),
            _ => None,
        }
    }

    pub fn as_email(&self) -> Option<&Email> {
        match self {
            ChannelPayload::Email(email) => Some(email),
            _ => None,
        }
    }

    pub fn as_email_group(&self) -> Option<&EmailGroup> {
        match self {
            ChannelPayload::EmailGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_sns(&self) -> Option<&Sns> {
        match self {
            ChannelPayload::Sns(sns) => Some(sns),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_accepts_plain_string_and_object() {
        let group: EmailGroup = serde_json::from_value(serde_json::json!({
            "recipient_list": ["a@example.com", {"recipient": "b@example.com"}]
        }))
        .unwrap();
        assert_eq!(
            group.recipient_list,
            vec![EmailRecipient::new("a@example.com"), EmailRecipient::new("b@example.com")]
        );
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["recipient_list"][0]["recipient"], "a@example.com");
    }

    #[test]
    fn test_webhook_defaults() {
        let webhook: Webhook =
            serde_json::from_value(serde_json::json!({"url": "https://example.com"})).unwrap();
        assert_eq!(webhook.method, "POST");
        assert!(webhook.header_params.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Slack, _> =
            serde_json::from_value(serde_json::json!({"url": "https://x", "token": "y"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_smtp_method_tags() {
        let method: SmtpMethod = serde_json::from_value(serde_json::json!("start_tls")).unwrap();
        assert_eq!(method, SmtpMethod::StartTls);
        assert!(serde_json::from_value::<SmtpMethod>(serde_json::json!("tls")).is_err());
    }

    #[test]
    fn test_channel_type_of_payload() {
        let payload = ChannelPayload::CustomWebhook(Webhook {
            url: "https://example.com".to_string(),
            header_params: BTreeMap::new(),
            method: "PUT".to_string(),
        });
        assert_eq!(payload.channel_type(), ChannelType::CustomWebhook);
    }
}
