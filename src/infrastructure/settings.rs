use std::sync::RwLock;

use crate::domain::service::settings_provider::{
    NotificationSettings, SettingsProvider, SettingsStore,
};

/// LiveSettings は実行中に差し替え可能な送信設定を保持する。
///
/// 読み出しは毎回最新のスナップショットを複製して返す。
pub struct LiveSettings {
    inner: RwLock<NotificationSettings>,
}

impl LiveSettings {
    pub fn new(initial: NotificationSettings) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }
}

impl SettingsStore for LiveSettings {
    /// 設定全体を置き換える。以降の送信から反映される。
    fn replace(&self, next: NotificationSettings) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
        tracing::info!(
            host_deny_list = guard.host_deny_list.len(),
            sanitization_enabled = guard.email_html_sanitization_enabled,
            "notification settings replaced"
        );
    }
}

impl SettingsProvider for LiveSettings {
    fn current(&self) -> NotificationSettings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
