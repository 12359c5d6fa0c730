use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::domain::entity::channel_payload::{
    ChannelPayload, Chime, Email, EmailGroup, EmailRecipient, MicrosoftTeams, Slack, SmtpAccount,
    Sns, Webhook,
};
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::config_query::PayloadField;
use crate::domain::entity::destination::{BodyStyle, WebhookTarget};
use crate::domain::service::channel_descriptor::{
    ChannelDescriptor, DeliveryFamily, PayloadDescriptor, PayloadKind,
};
use crate::domain::service::channel_validation::{
    require_non_empty, validate_email, validate_https_url, validate_method, ConfigError,
};

const SLACK_URL_PREFIXES: [&str; 2] = [
    "https://hooks.slack.com/services",
    "https://hooks.gov-slack.com/services",
];
const CHIME_URL_PREFIX: &str = "https://hooks.chime.aws/incomingwebhooks/";
const TEAMS_ALLOWED_DOMAINS: [&str; 3] = ["webhook.office.com", "powerplatform.com", "logic.azure.com"];

static SNS_TOPIC_ARN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^arn:aws(-[^:]+)?:sns:([a-zA-Z0-9-]+):([0-9]{12}):([a-zA-Z0-9_-]+)(\.fifo)?$").ok()
});
static IAM_ROLE_ARN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^arn:aws(-[^:]+)?:iam::([0-9]{12}):role/.+$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

fn chat_target(url: &str, body_style: BodyStyle) -> WebhookTarget {
    WebhookTarget {
        url: url.to_string(),
        method: "POST".to_string(),
        headers: BTreeMap::new(),
        body_style,
    }
}

fn single(path: &str, expected: &str, value: &str) -> Vec<String> {
    if path == expected {
        vec![value.to_string()]
    } else {
        Vec::new()
    }
}

fn recipients(list: &[EmailRecipient]) -> Vec<String> {
    list.iter().map(|r| r.recipient.clone()).collect()
}

fn validate_recipients(list: &[EmailRecipient]) -> Result<(), ConfigError> {
    list.iter()
        .try_for_each(|r| validate_email("recipient", &r.recipient))
}

impl PayloadKind for Slack {
    const FIELDS: &'static [PayloadField] = &[PayloadField::text("url")];

    fn validate(&self) -> Result<(), ConfigError> {
        validate_https_url(&self.url)?;
        if !SLACK_URL_PREFIXES.iter().any(|p| self.url.contains(p)) {
            return Err(ConfigError::invalid(
                "Wrong Slack url. Should contain \"hooks.slack.com/services/\" or \"hooks.gov-slack.com/services/\"",
            ));
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        single(path, "url", &self.url)
    }

    fn webhook_target(&self, body_style: BodyStyle) -> Option<WebhookTarget> {
        Some(chat_target(&self.url, body_style))
    }
}

impl PayloadKind for Chime {
    const FIELDS: &'static [PayloadField] = &[PayloadField::text("url")];

    fn validate(&self) -> Result<(), ConfigError> {
        validate_https_url(&self.url)?;
        let has_token = self.url.contains(CHIME_URL_PREFIX) && self.url.contains("?token=");
        if !has_token {
            return Err(ConfigError::invalid(
                "Wrong Chime url. Should contain \"hooks.chime.aws/incomingwebhooks/\" and \"?token=\"",
            ));
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        single(path, "url", &self.url)
    }

    fn webhook_target(&self, body_style: BodyStyle) -> Option<WebhookTarget> {
        Some(chat_target(&self.url, body_style))
    }
}

impl PayloadKind for MicrosoftTeams {
    const FIELDS: &'static [PayloadField] = &[PayloadField::text("url")];

    fn validate(&self) -> Result<(), ConfigError> {
        validate_https_url(&self.url)?;
        if !TEAMS_ALLOWED_DOMAINS.iter().any(|d| self.url.contains(d)) {
            return Err(ConfigError::invalid(format!(
                "Wrong Microsoft Teams URL. Allowed domains: {}",
                TEAMS_ALLOWED_DOMAINS.join(", ")
            )));
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        single(path, "url", &self.url)
    }

    fn webhook_target(&self, body_style: BodyStyle) -> Option<WebhookTarget> {
        Some(chat_target(&self.url, body_style))
    }
}

impl PayloadKind for Webhook {
    const FIELDS: &'static [PayloadField] =
        &[PayloadField::text("url"), PayloadField::keyword("method")];

    fn validate(&self) -> Result<(), ConfigError> {
        validate_https_url(&self.url)?;
        validate_method(&self.method)?;
        if self.header_params.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::invalid("header name is null or empty"));
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        match path {
            "url" => vec![self.url.clone()],
            "method" => vec![self.method.clone()],
            _ => Vec::new(),
        }
    }

    fn webhook_target(&self, body_style: BodyStyle) -> Option<WebhookTarget> {
        Some(WebhookTarget {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.header_params.clone(),
            body_style,
        })
    }
}

impl PayloadKind for SmtpAccount {
    const FIELDS: &'static [PayloadField] = &[
        PayloadField::text("host"),
        PayloadField::keyword("port"),
        PayloadField::keyword("method"),
        PayloadField::text("from_address"),
    ];

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("host", &self.host)?;
        if self.port == 0 {
            return Err(ConfigError::invalid("port should be positive value"));
        }
        validate_email("from_address", &self.from_address)
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        match path {
            "host" => vec![self.host.clone()],
            "port" => vec![self.port.to_string()],
            "method" => vec![self.method.tag().to_string()],
            "from_address" => vec![self.from_address.clone()],
            _ => Vec::new(),
        }
    }
}

impl PayloadKind for Email {
    const FIELDS: &'static [PayloadField] = &[
        PayloadField::keyword("email_account_id"),
        PayloadField::keyword("email_group_id_list"),
        PayloadField::nested_text("recipient_list.recipient"),
    ];

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("email_account_id", &self.email_account_id)?;
        validate_recipients(&self.recipient_list)?;
        for id in &self.email_group_id_list {
            require_non_empty("email_group_id", id)?;
        }
        if self.recipient_list.is_empty() && self.email_group_id_list.is_empty() {
            return Err(ConfigError::invalid(
                "Either recipient_list or email_group_id_list must be provided",
            ));
        }
        if self.email_group_id_list.contains(&self.email_account_id) {
            return Err(ConfigError::invalid(format!(
                "Config IDs {} is in both emailAccountID and emailGroupIds",
                self.email_account_id
            )));
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        match path {
            "email_account_id" => vec![self.email_account_id.clone()],
            "email_group_id_list" => self.email_group_id_list.clone(),
            "recipient_list.recipient" => recipients(&self.recipient_list),
            _ => Vec::new(),
        }
    }
}

impl PayloadKind for EmailGroup {
    const FIELDS: &'static [PayloadField] = &[PayloadField::nested_text("recipient_list.recipient")];

    fn validate(&self) -> Result<(), ConfigError> {
        if self.recipient_list.is_empty() {
            return Err(ConfigError::invalid("recipient_list is null or empty"));
        }
        validate_recipients(&self.recipient_list)
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        if path == "recipient_list.recipient" {
            recipients(&self.recipient_list)
        } else {
            Vec::new()
        }
    }
}

impl PayloadKind for Sns {
    const FIELDS: &'static [PayloadField] =
        &[PayloadField::text("topic_arn"), PayloadField::text("role_arn")];

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("topic_arn", &self.topic_arn)?;
        if !matches(&SNS_TOPIC_ARN, &self.topic_arn) {
            return Err(ConfigError::invalid(format!(
                "Invalid AWS SNS topic ARN: {}",
                self.topic_arn
            )));
        }
        if let Some(role_arn) = &self.role_arn {
            if !matches(&IAM_ROLE_ARN, role_arn) {
                return Err(ConfigError::invalid(format!(
                    "Invalid AWS IAM role ARN: {}",
                    role_arn
                )));
            }
        }
        Ok(())
    }

    fn field_values(&self, path: &str) -> Vec<String> {
        match path {
            "topic_arn" => vec![self.topic_arn.clone()],
            "role_arn" => self.role_arn.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// 対応する全種別の記述子を 1 種別 1 宣言で返す。
pub fn standard_descriptors() -> Vec<Arc<dyn ChannelDescriptor>> {
    vec![
        Arc::new(
            PayloadDescriptor::<Slack>::new(
                ChannelType::Slack,
                Some(DeliveryFamily::Webhook),
                ChannelPayload::Slack,
                |p| match p {
                    ChannelPayload::Slack(v) => Some(v),
                    _ => None,
                },
            )
            .with_body_style(BodyStyle::Text),
        ),
        Arc::new(PayloadDescriptor::<Chime>::new(
            ChannelType::Chime,
            Some(DeliveryFamily::Webhook),
            ChannelPayload::Chime,
            |p| match p {
                ChannelPayload::Chime(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(
            PayloadDescriptor::<MicrosoftTeams>::new(
                ChannelType::MicrosoftTeams,
                Some(DeliveryFamily::Webhook),
                ChannelPayload::MicrosoftTeams,
                |p| match p {
                    ChannelPayload::MicrosoftTeams(v) => Some(v),
                    _ => None,
                },
            )
            .with_body_style(BodyStyle::Text),
        ),
        Arc::new(PayloadDescriptor::<Webhook>::new(
            ChannelType::Webhook,
            Some(DeliveryFamily::Webhook),
            ChannelPayload::Webhook,
            |p| match p {
                ChannelPayload::Webhook(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(PayloadDescriptor::<Webhook>::new(
            ChannelType::CustomWebhook,
            Some(DeliveryFamily::Webhook),
            ChannelPayload::CustomWebhook,
            |p| match p {
                ChannelPayload::CustomWebhook(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(PayloadDescriptor::<SmtpAccount>::new(
            ChannelType::SmtpAccount,
            None,
            ChannelPayload::SmtpAccount,
            |p| match p {
                ChannelPayload::SmtpAccount(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(PayloadDescriptor::<Email>::new(
            ChannelType::Email,
            Some(DeliveryFamily::Email),
            ChannelPayload::Email,
            |p| match p {
                ChannelPayload::Email(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(PayloadDescriptor::<EmailGroup>::new(
            ChannelType::EmailGroup,
            None,
            ChannelPayload::EmailGroup,
            |p| match p {
                ChannelPayload::EmailGroup(v) => Some(v),
                _ => None,
            },
        )),
        Arc::new(PayloadDescriptor::<Sns>::new(
            ChannelType::Sns,
            Some(DeliveryFamily::Sns),
            ChannelPayload::Sns,
            |p| match p {
                ChannelPayload::Sns(v) => Some(v),
                _ => None,
            },
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_url_rules() {
        let ok = Slack {
            url: "https://hooks.slack.com/services/T/B/X".to_string(),
        };
        assert!(ok.validate().is_ok());
        let wrong_host = Slack {
            url: "https://example.com/services".to_string(),
        };
        assert!(wrong_host.validate().is_err());
        let plain_http = Slack {
            url: "http://hooks.slack.com/services/T/B/X".to_string(),
        };
        assert!(plain_http.validate().is_err());
    }

    #[test]
    fn test_slack_url_may_contain_hook_prefix_anywhere() {
        let relayed = Slack {
            url: "https://relay.example.com/forward?to=https://hooks.slack.com/services/T/B/X"
                .to_string(),
        };
        assert!(relayed.validate().is_ok());
        let gov = Slack {
            url: "https://hooks.gov-slack.com/services/T/B/X".to_string(),
        };
        assert!(gov.validate().is_ok());
    }

    #[test]
    fn test_chime_requires_token() {
        let ok = Chime {
            url: "https://hooks.chime.aws/incomingwebhooks/abc?token=xyz".to_string(),
        };
        assert!(ok.validate().is_ok());
        let no_token = Chime {
            url: "https://hooks.chime.aws/incomingwebhooks/abc".to_string(),
        };
        assert!(no_token.validate().is_err());
    }

    #[test]
    fn test_teams_allowed_domains() {
        let ok = MicrosoftTeams {
            url: "https://contoso.webhook.office.com/webhookb2/abc".to_string(),
        };
        assert!(ok.validate().is_ok());
        let bad = MicrosoftTeams {
            url: "https://example.com/hook".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_smtp_account_rules() {
        let mut account = SmtpAccount {
            host: "smtp.example.com".to_string(),
            port: 465,
            method: crate::domain::entity::channel_payload::SmtpMethod::Ssl,
            from_address: "sender@example.com".to_string(),
        };
        assert!(account.validate().is_ok());
        account.port = 0;
        assert!(account.validate().is_err());
        account.port = 465;
        account.host = String::new();
        assert!(account.validate().is_err());
        account.host = "smtp.example.com".to_string();
        account.from_address = "not-an-email".to_string();
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_email_rules() {
        let email = Email {
            email_account_id: "acc".to_string(),
            recipient_list: vec![EmailRecipient::new("a@example.com")],
            email_group_id_list: vec!["acc".to_string()],
        };
        let err = email.validate().unwrap_err();
        assert!(err.to_string().contains("is in both"));

        let empty = Email {
            email_account_id: "acc".to_string(),
            recipient_list: vec![],
            email_group_id_list: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_sns_arn_rules() {
        let ok = Sns {
            topic_arn: "arn:aws:sns:us-west-2:123456789012:alerts".to_string(),
            role_arn: Some("arn:aws:iam::123456789012:role/notify".to_string()),
        };
        assert!(ok.validate().is_ok());
        let bad_topic = Sns {
            topic_arn: "arn:aws:sqs:us-west-2:123456789012:alerts".to_string(),
            role_arn: None,
        };
        assert!(bad_topic.validate().is_err());
        let bad_role = Sns {
            topic_arn: "arn:aws:sns:us-west-2:123456789012:alerts".to_string(),
            role_arn: Some("role".to_string()),
        };
        assert!(bad_role.validate().is_err());
    }

    #[test]
    fn test_email_field_values() {
        let email = Email {
            email_account_id: "acc".to_string(),
            recipient_list: vec![EmailRecipient::new("a@example.com")],
            email_group_id_list: vec!["g1".to_string(), "g2".to_string()],
        };
        assert_eq!(email.field_values("email_group_id_list"), vec!["g1", "g2"]);
        assert_eq!(email.field_values("recipient_list.recipient"), vec!["a@example.com"]);
        assert!(email.field_values("url").is_empty());
    }

    #[test]
    fn test_one_descriptor_per_supported_type() {
        let descriptors = standard_descriptors();
        let types: Vec<ChannelType> = descriptors.iter().map(|d| d.channel_type()).collect();
        assert_eq!(types, ChannelType::SUPPORTED.to_vec());
    }
}
