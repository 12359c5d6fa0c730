use std::collections::BTreeMap;

use crate::domain::entity::channel_payload::{SmtpAccount, Sns};

/// BodyStyle は webhook 系チャネルに送る JSON 本文の形を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStyle {
    /// `{"text": "..."}`（Slack / Microsoft Teams）
    Text,
    /// `{"Content": "..."}`、または本文が JSON オブジェクトならそのまま送る（Chime / webhook）
    Content,
}

/// WebhookTarget は webhook 系チャネル 1 件の送信先を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body_style: BodyStyle,
}

/// SmtpTarget は SMTP アカウント経由で送る 1 宛先を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpTarget {
    pub account_id: String,
    pub account_name: String,
    pub account: SmtpAccount,
    pub recipient: String,
}

/// SnsTarget は SNS トピックへの発行先を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsTarget {
    pub topic_arn: String,
    pub role_arn: Option<String>,
}

impl From<&Sns> for SnsTarget {
    fn from(sns: &Sns) -> Self {
        Self {
            topic_arn: sns.topic_arn.clone(),
            role_arn: sns.role_arn.clone(),
        }
    }
}
