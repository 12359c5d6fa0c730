use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::entity::channel_type::ChannelType;
use crate::domain::entity::feature::Feature;
use crate::domain::service::settings_provider::{default_allow_list, NotificationSettings};
use crate::usecase::config_validator::ConfigPolicy;

/// Application configuration for notification channel server.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub notification: DeliveryConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8093
}

/// LogConfig はログ出力の設定を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` または `text`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// SmtpCredential は SMTP アカウント設定 ID ごとの認証情報を表す。
#[derive(Debug, Deserialize)]
pub struct SmtpCredential {
    pub username: SecretString,
    pub password: SecretString,
}

/// SnsConfig は AWS SDK の基本設定を表す。リージョンは送信時にトピック ARN から決まる。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnsConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// DeliveryConfig はチャネル送信とチャネル設定の受付範囲を表す。
#[derive(Debug, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_connections_per_route")]
    pub max_connections_per_route: usize,
    #[serde(default = "default_email_size_limit")]
    pub email_size_limit: usize,
    #[serde(default = "default_email_minimum_header_length")]
    pub email_minimum_header_length: usize,
    #[serde(default)]
    pub host_deny_list: Vec<String>,
    #[serde(default = "default_true")]
    pub email_html_sanitization_enabled: bool,
    #[serde(default = "default_allow_list")]
    pub email_html_sanitization_allow_list: Vec<String>,
    #[serde(default)]
    pub email_html_sanitization_deny_list: Vec<String>,
    #[serde(default)]
    pub smtp_credentials: HashMap<String, SmtpCredential>,
    #[serde(default)]
    pub sns: SnsConfig,
    #[serde(default = "default_allowed_config_types")]
    pub allowed_config_types: Vec<String>,
    #[serde(default = "default_allowed_config_features")]
    pub allowed_config_features: Vec<String>,
    #[serde(default = "default_true")]
    pub tooltip_support: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            socket_timeout_ms: default_socket_timeout_ms(),
            max_connections: default_max_connections(),
            max_connections_per_route: default_max_connections_per_route(),
            email_size_limit: default_email_size_limit(),
            email_minimum_header_length: default_email_minimum_header_length(),
            host_deny_list: Vec::new(),
            email_html_sanitization_enabled: true,
            email_html_sanitization_allow_list: default_allow_list(),
            email_html_sanitization_deny_list: Vec::new(),
            smtp_credentials: HashMap::new(),
            sns: SnsConfig::default(),
            allowed_config_types: default_allowed_config_types(),
            allowed_config_features: default_allowed_config_features(),
            tooltip_support: true,
        }
    }
}

impl DeliveryConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    /// 送信時に参照する設定の初期スナップショット。
    pub fn settings(&self) -> NotificationSettings {
        NotificationSettings {
            email_html_sanitization_enabled: self.email_html_sanitization_enabled,
            email_html_sanitization_allow_list: self.email_html_sanitization_allow_list.clone(),
            email_html_sanitization_deny_list: self.email_html_sanitization_deny_list.clone(),
            host_deny_list: self.host_deny_list.clone(),
        }
    }

    /// 受付可能な種別・feature を検証済みの型に変換する。未知のタグは設定エラー。
    pub fn policy(&self) -> anyhow::Result<ConfigPolicy> {
        let allowed_config_types = self
            .allowed_config_types
            .iter()
            .map(|tag| {
                ChannelType::from_tag(tag)
                    .filter(|t| *t != ChannelType::None)
                    .ok_or_else(|| anyhow::anyhow!("unknown config type in allowed_config_types: {}", tag))
            })
            .collect::<anyhow::Result<BTreeSet<_>>>()?;
        let allowed_features = self
            .allowed_config_features
            .iter()
            .map(|tag| {
                Feature::from_tag(tag)
                    .ok_or_else(|| anyhow::anyhow!("unknown feature in allowed_config_features: {}", tag))
            })
            .collect::<anyhow::Result<BTreeSet<_>>>()?;
        Ok(ConfigPolicy {
            allowed_config_types,
            allowed_features,
        })
    }
}

fn default_connection_timeout_ms() -> u64 {
    5000
}

fn default_socket_timeout_ms() -> u64 {
    50000
}

fn default_max_connections() -> usize {
    60
}

fn default_max_connections_per_route() -> usize {
    20
}

fn default_email_size_limit() -> usize {
    10_000_000
}

fn default_email_minimum_header_length() -> usize {
    160
}

fn default_true() -> bool {
    true
}

fn default_allowed_config_types() -> Vec<String> {
    ChannelType::SUPPORTED
        .iter()
        .map(|t| t.tag().to_string())
        .collect()
}

fn default_allowed_config_features() -> Vec<String> {
    Feature::ALL.iter().map(|f| f.tag().to_string()).collect()
}
