use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::entity::channel_config::NotificationConfig;
use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::feature::Feature;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::ConfigError;

/// ConfigPolicy は作成・更新を受け付ける種別と feature の範囲を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPolicy {
    pub allowed_config_types: BTreeSet<ChannelType>,
    pub allowed_features: BTreeSet<Feature>,
}

impl Default for ConfigPolicy {
    fn default() -> Self {
        Self {
            allowed_config_types: ChannelType::SUPPORTED.into_iter().collect(),
            allowed_features: Feature::ALL.into_iter().collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidateConfigError {
    #[error(transparent)]
    Rejected(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ConfigValidator は保存前に設定の許可範囲と参照先を検証する。
pub struct ConfigValidator {
    repo: Arc<dyn ChannelConfigRepository>,
    policy: ConfigPolicy,
}

impl ConfigValidator {
    pub fn new(repo: Arc<dyn ChannelConfigRepository>, policy: ConfigPolicy) -> Self {
        Self { repo, policy }
    }

    pub async fn validate(&self, config: &NotificationConfig) -> Result<(), ValidateConfigError> {
        let config_type = config.config_type();
        if !self.policy.allowed_config_types.contains(&config_type) {
            return Err(ConfigError::NotAcceptable(format!(
                "config_type {} is not allowed",
                config_type
            ))
            .into());
        }
        if let Some(feature) = config
            .feature_list
            .iter()
            .find(|f| !self.policy.allowed_features.contains(f))
        {
            return Err(ConfigError::NotAcceptable(format!("feature {} is not allowed", feature)).into());
        }

        if let Some(email) = config.payload.as_email() {
            self.validate_email_references(
                &email.email_account_id,
                &email.email_group_id_list,
                &config.feature_list,
            )
            .await?;
        }
        Ok(())
    }

    async fn validate_email_references(
        &self,
        account_id: &str,
        group_ids: &[String],
        features: &BTreeSet<Feature>,
    ) -> Result<(), ValidateConfigError> {
        let mut ids = vec![account_id.to_string()];
        ids.extend(group_ids.iter().cloned());

        let found = self
            .repo
            .find_many(&ids)
            .await
            .map_err(|e| ValidateConfigError::Internal(e.to_string()))?;

        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| !found.iter().any(|doc| &doc.config_id == *id))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::NotFound(format!(
                "Config IDs not found:[{}]",
                missing.join(", ")
            ))
            .into());
        }

        for doc in &found {
            if doc.config_id == account_id {
                if doc.config_type() != ChannelType::SmtpAccount {
                    return Err(ConfigError::NotAcceptable(format!(
                        "configId {} is not a valid email account",
                        doc.config_id
                    ))
                    .into());
                }
                if let Some(feature) = features
                    .iter()
                    .find(|f| !doc.config.feature_list.contains(f))
                {
                    return Err(ConfigError::Forbidden(format!(
                        "Feature {} is not enabled on email account {}",
                        feature, doc.config_id
                    ))
                    .into());
                }
            } else if doc.config_type() != ChannelType::EmailGroup {
                return Err(ConfigError::NotAcceptable(format!(
                    "configId {} is not a valid email group",
                    doc.config_id
                ))
                .into());
            }
        }
        Ok(())
    }
}
