use std::sync::Arc;

use crate::domain::service::{ConfigError, NotificationSettings, SettingsStore};

/// UpdateSettingsInput は差し替える項目だけを持つ。`None` の項目は現在値を引き継ぐ。
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub email_html_sanitization_enabled: Option<bool>,
    pub email_html_sanitization_allow_list: Option<Vec<String>>,
    pub email_html_sanitization_deny_list: Option<Vec<String>>,
    pub host_deny_list: Option<Vec<String>>,
}

/// SettingsUseCase は送信時に参照する設定の参照と実行中の更新を行う。
pub struct SettingsUseCase {
    store: Arc<dyn SettingsStore>,
}

impl SettingsUseCase {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn current(&self) -> NotificationSettings {
        self.store.current()
    }

    pub fn update(&self, input: &UpdateSettingsInput) -> Result<NotificationSettings, ConfigError> {
        let mut next = self.store.current();
        if let Some(enabled) = input.email_html_sanitization_enabled {
            next.email_html_sanitization_enabled = enabled;
        }
        if let Some(list) = &input.email_html_sanitization_allow_list {
            next.email_html_sanitization_allow_list =
                normalize("email_html_sanitization_allow_list", list)?;
        }
        if let Some(list) = &input.email_html_sanitization_deny_list {
            next.email_html_sanitization_deny_list =
                normalize("email_html_sanitization_deny_list", list)?;
        }
        if let Some(list) = &input.host_deny_list {
            next.host_deny_list = normalize("host_deny_list", list)?;
        }

        self.store.replace(next.clone());
        Ok(next)
    }
}

/// 前後の空白を除き、空要素と空白を含む要素を拒否する。
fn normalize(field: &str, list: &[String]) -> Result<Vec<String>, ConfigError> {
    list.iter()
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() || entry.contains(char::is_whitespace) {
                Err(ConfigError::invalid(format!(
                    "{} contains an invalid entry: {:?}",
                    field, entry
                )))
            } else {
                Ok(entry.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::settings::LiveSettings;
    use crate::domain::service::SettingsProvider;

    fn usecase() -> (SettingsUseCase, Arc<LiveSettings>) {
        let store = Arc::new(LiveSettings::new(NotificationSettings::default()));
        (SettingsUseCase::new(store.clone()), store)
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let (uc, store) = usecase();
        let updated = uc
            .update(&UpdateSettingsInput {
                host_deny_list: Some(vec![" 10.0.0.0/8 ".to_string(), "internal.example.com".to_string()]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.host_deny_list, vec!["10.0.0.0/8", "internal.example.com"]);
        assert!(updated.email_html_sanitization_enabled);
        assert_eq!(
            updated.email_html_sanitization_allow_list,
            NotificationSettings::default().email_html_sanitization_allow_list
        );
        assert_eq!(store.current(), updated);
    }

    #[test]
    fn sanitization_flags_and_lists() {
        let (uc, store) = usecase();
        uc.update(&UpdateSettingsInput {
            email_html_sanitization_enabled: Some(false),
            email_html_sanitization_allow_list: Some(vec!["formatting".to_string()]),
            email_html_sanitization_deny_list: Some(vec!["img".to_string()]),
            ..Default::default()
        })
        .unwrap();
        let current = store.current();
        assert!(!current.email_html_sanitization_enabled);
        assert_eq!(current.email_html_sanitization_allow_list, vec!["formatting"]);
        assert_eq!(current.email_html_sanitization_deny_list, vec!["img"]);
    }

    #[test]
    fn invalid_entry_leaves_settings_unchanged() {
        let (uc, store) = usecase();
        let err = uc
            .update(&UpdateSettingsInput {
                email_html_sanitization_enabled: Some(false),
                host_deny_list: Some(vec!["ok.example.com".to_string(), "bad host".to_string()]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
        assert_eq!(store.current(), NotificationSettings::default());
    }
}
