use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ChannelType は通知チャネル設定の種別タグを表す。
///
/// `None` は未対応種別の番兵であり、永続化も送信もできない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    None,
    Slack,
    Chime,
    MicrosoftTeams,
    Webhook,
    CustomWebhook,
    SmtpAccount,
    Email,
    EmailGroup,
    Sns,
}

impl ChannelType {
    /// 登録可能な全種別（`None` を除く）。
    pub const SUPPORTED: [ChannelType; 9] = [
        ChannelType::Slack,
        ChannelType::Chime,
        ChannelType::MicrosoftTeams,
        ChannelType::Webhook,
        ChannelType::CustomWebhook,
        ChannelType::SmtpAccount,
        ChannelType::Email,
        ChannelType::EmailGroup,
        ChannelType::Sns,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ChannelType::None => "none",
            ChannelType::Slack => "slack",
            ChannelType::Chime => "chime",
            ChannelType::MicrosoftTeams => "microsoft_teams",
            ChannelType::Webhook => "webhook",
            ChannelType::CustomWebhook => "custom_webhook",
            ChannelType::SmtpAccount => "smtp_account",
            ChannelType::Email => "email",
            ChannelType::EmailGroup => "email_group",
            ChannelType::Sns => "sns",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        std::iter::once(ChannelType::None)
            .chain(Self::SUPPORTED)
            .find(|t| t.tag() == tag)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown config type: {}", s))
    }
}
