use serde::Serialize;

/// NotificationSettings は送信時に参照するプロセス全体の設定のスナップショット。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSettings {
    pub email_html_sanitization_enabled: bool,
    pub email_html_sanitization_allow_list: Vec<String>,
    pub email_html_sanitization_deny_list: Vec<String>,
    pub host_deny_list: Vec<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_html_sanitization_enabled: true,
            email_html_sanitization_allow_list: default_allow_list(),
            email_html_sanitization_deny_list: Vec::new(),
            host_deny_list: Vec::new(),
        }
    }
}

pub fn default_allow_list() -> Vec<String> {
    ["formatting", "blocks", "links", "tables", "images", "styles"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// SettingsProvider は最新の設定を返す。呼び出しごとに取り直し、キャッシュしない。
#[cfg_attr(test, mockall::automock)]
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> NotificationSettings;
}

/// SettingsStore は実行中の設定の差し替えを受け付ける。
pub trait SettingsStore: SettingsProvider {
    /// 以降の `current()` から新しい設定を返す。
    fn replace(&self, next: NotificationSettings);
}
