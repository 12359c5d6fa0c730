use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// ConfigError はチャネル設定の構築・検証・参照解決で発生するドメインエラーを表す。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    InvalidConfig(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotAcceptable(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// 許可される custom webhook の HTTP メソッド。
pub const ALLOWED_WEBHOOK_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

// RFC 5322 ベースのメールアドレスパターン（大文字小文字を区別しない）
const EMAIL_PATTERN: &str = concat!(
    r#"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*"#,
    r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
    r"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
    r"|\[(?:(?:(2(5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9]))\.){3}",
    r"(?:(2(5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9])|[a-z0-9-]*[a-z0-9]:",
    r"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$",
);

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_REGEX
        .as_ref()
        .is_some_and(|re| re.is_match(address))
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(format!("{} is null or empty", field)));
    }
    Ok(())
}

/// https の URL であることを検証する。http を含むそれ以外のスキームは拒否する。
pub fn validate_https_url(input: &str) -> Result<Url, ConfigError> {
    require_non_empty("url", input)?;
    let parsed =
        Url::parse(input).map_err(|e| ConfigError::invalid(format!("Invalid URL {}: {}", input, e)))?;
    if parsed.scheme() != "https" {
        return Err(ConfigError::invalid(format!(
            "Invalid URL {}: only https protocol is supported",
            input
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::invalid(format!("Invalid URL {}: host is missing", input)));
    }
    Ok(parsed)
}

/// `mailto:` 形式の宛先を素のアドレスにする。
pub fn strip_mailto(address: &str) -> &str {
    address.strip_prefix("mailto:").unwrap_or(address)
}

pub fn validate_email(field: &str, address: &str) -> Result<(), ConfigError> {
    require_non_empty(field, address)?;
    let address = strip_mailto(address);
    if !is_valid_email(address) {
        return Err(ConfigError::invalid(format!("Invalid email address: {}", address)));
    }
    Ok(())
}

pub fn validate_method(method: &str) -> Result<(), ConfigError> {
    require_non_empty("Method", method)?;
    if !ALLOWED_WEBHOOK_METHODS.contains(&method) {
        return Err(ConfigError::invalid(
            "Invalid method supplied. Only POST, PUT and PATCH are allowed",
        ));
    }
    Ok(())
}
