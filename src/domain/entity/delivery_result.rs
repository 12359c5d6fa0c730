use serde::{Deserialize, Serialize};

use crate::domain::entity::channel_type::ChannelType;

/// 送信先の元レスポンスを (code, text) に正規化した配信ステータス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub status_code: String,
    pub status_text: String,
}

impl DeliveryStatus {
    pub fn new(status_code: impl Into<String>, status_text: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            status_text: status_text.into(),
        }
    }

    /// HTTP 200〜207 を成功とみなす。
    pub fn is_success(&self) -> bool {
        self.status_code
            .parse::<u16>()
            .is_ok_and(|code| (200..=207).contains(&code))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipientStatus {
    pub recipient: String,
    pub delivery_status: DeliveryStatus,
}

impl EmailRecipientStatus {
    pub fn new(recipient: impl Into<String>, delivery_status: DeliveryStatus) -> Self {
        Self {
            recipient: recipient.into(),
            delivery_status,
        }
    }
}

/// 宛先が 1 件も決まらなかったメール結果に入れる代替宛先。
pub const UNKNOWN_RECIPIENT: &str = "unknown-recipient@example.com";

/// DeliveryResult は送信対象チャネル 1 件分の配信結果を表す。
///
/// email 種別は空でない宛先別ステータスを必ず持ち、`delivery_status` はその集約になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub config_id: String,
    pub config_name: String,
    pub config_type: ChannelType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_recipient_status: Vec<EmailRecipientStatus>,
    pub delivery_status: DeliveryStatus,
}

impl DeliveryResult {
    pub fn single(
        config_id: impl Into<String>,
        config_name: impl Into<String>,
        config_type: ChannelType,
        delivery_status: DeliveryStatus,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            config_name: config_name.into(),
            config_type,
            email_recipient_status: Vec::new(),
            delivery_status,
        }
    }

    /// 宛先別ステータスから email 結果を組み立てる。
    ///
    /// 全宛先のコードが一致すれば先頭のステータス、一致しなければ `207 Errors` を集約値とする。
    pub fn email(
        config_id: impl Into<String>,
        config_name: impl Into<String>,
        mut recipients: Vec<EmailRecipientStatus>,
        fallback: DeliveryStatus,
    ) -> Self {
        if recipients.is_empty() {
            recipients.push(EmailRecipientStatus::new(UNKNOWN_RECIPIENT, fallback));
        }
        let first = recipients[0].delivery_status.clone();
        let overall = if recipients
            .iter()
            .all(|r| r.delivery_status.status_code == first.status_code)
        {
            first
        } else {
            DeliveryStatus::new("207", "Errors")
        };
        Self {
            config_id: config_id.into(),
            config_name: config_name.into(),
            config_type: ChannelType::Email,
            email_recipient_status: recipients,
            delivery_status: overall,
        }
    }
}
