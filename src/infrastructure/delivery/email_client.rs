use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::domain::entity::channel_payload::SmtpMethod;
use crate::domain::entity::delivery_result::DeliveryStatus;
use crate::domain::entity::destination::SmtpTarget;
use crate::domain::entity::message::{FileEncoding, MessageContent};
use crate::domain::service::{DeliveryError, EmailDeliveryClient, HtmlSanitizer, SettingsProvider};
use crate::infrastructure::config::SmtpCredential;

/// SmtpFailure は SMTP 送信の失敗を分類したもの。
#[derive(Debug, thiserror::Error)]
pub enum SmtpFailure {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl From<lettre::transport::smtp::Error> for SmtpFailure {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        let io_source = std::error::Error::source(&err)
            .is_some_and(|source| source.downcast_ref::<std::io::Error>().is_some());
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_permanent() || err.is_transient() {
            Self::Rejected(err.to_string())
        } else if io_source {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// SmtpMailer は組み立て済みのメールを SMTP アカウント経由で送る。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmtpMailer: Send + Sync {
    async fn deliver(&self, target: &SmtpTarget, email: Message) -> Result<(), SmtpFailure>;
}

/// LettreSmtpMailer は lettre の非同期 SMTP トランスポートで送信する。
///
/// 認証情報は SMTP アカウント設定 ID ごとに設定ファイルから与える。
/// `method = none` のアカウントは認証しない。
pub struct LettreSmtpMailer {
    credentials: HashMap<String, SmtpCredential>,
    timeout: Duration,
}

impl LettreSmtpMailer {
    pub fn new(credentials: HashMap<String, SmtpCredential>, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }

    fn transport(&self, target: &SmtpTarget) -> Result<AsyncSmtpTransport<Tokio1Executor>, SmtpFailure> {
        let account = &target.account;
        let builder = match account.method {
            SmtpMethod::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(&account.host)?,
            SmtpMethod::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.host)?
            }
            SmtpMethod::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&account.host),
        };
        let mut builder = builder.port(account.port).timeout(Some(self.timeout));

        if account.method != SmtpMethod::None {
            if let Some(credential) = self.credentials.get(&target.account_id) {
                builder = builder.credentials(Credentials::new(
                    credential.username.expose_secret().to_string(),
                    credential.password.expose_secret().to_string(),
                ));
            }
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl SmtpMailer for LettreSmtpMailer {
    async fn deliver(&self, target: &SmtpTarget, email: Message) -> Result<(), SmtpFailure> {
        let transport = self.transport(target)?;
        transport.send(email).await?;
        Ok(())
    }
}

/// EmailLimits はメールサイズの上限判定に使う値。
#[derive(Debug, Clone, Copy)]
pub struct EmailLimits {
    pub size_limit: usize,
    pub minimum_header_length: usize,
}

/// SmtpEmailDeliveryClient は 1 宛先分のメールを組み立てて送信する。
pub struct SmtpEmailDeliveryClient {
    mailer: Arc<dyn SmtpMailer>,
    sanitizer: Arc<dyn HtmlSanitizer>,
    settings: Arc<dyn SettingsProvider>,
    limits: EmailLimits,
}

impl SmtpEmailDeliveryClient {
    pub fn new(
        mailer: Arc<dyn SmtpMailer>,
        sanitizer: Arc<dyn HtmlSanitizer>,
        settings: Arc<dyn SettingsProvider>,
        limits: EmailLimits,
    ) -> Self {
        Self {
            mailer,
            sanitizer,
            settings,
            limits,
        }
    }

    /// ヘッダー分を含めたおおよそのメールサイズ。
    fn approximate_size(&self, message: &MessageContent) -> usize {
        let attachment = message.attachment.as_ref().map_or(0, |a| {
            self.limits.minimum_header_length + a.file_data.len() + a.file_name.len()
        });
        self.limits.minimum_header_length
            + message.title.len()
            + message.text_description.len()
            + message.html_description.as_ref().map_or(0, String::len)
            + attachment
    }

    fn build_email(&self, target: &SmtpTarget, message: &MessageContent) -> Result<Message, DeliveryError> {
        let from: Mailbox = target
            .account
            .from_address
            .parse()
            .map_err(|e| DeliveryError::InvalidDestination(format!("invalid from address: {}", e)))?;
        let to: Mailbox = target
            .recipient
            .parse()
            .map_err(|e| DeliveryError::InvalidDestination(format!("invalid recipient address: {}", e)))?;

        let text = SinglePart::plain(message.text_description.clone());
        let alternative = match &message.html_description {
            Some(html) => {
                let settings = self.settings.current();
                let html = if settings.email_html_sanitization_enabled {
                    self.sanitizer.sanitize(
                        html,
                        &settings.email_html_sanitization_allow_list,
                        &settings.email_html_sanitization_deny_list,
                    )
                } else {
                    html.clone()
                };
                MultiPart::alternative()
                    .singlepart(text)
                    .singlepart(SinglePart::html(html))
            }
            None => MultiPart::alternative().singlepart(text),
        };

        let mut body = MultiPart::mixed().multipart(alternative);
        if let Some(attachment) = &message.attachment {
            let (data, default_type) = match attachment.file_encoding {
                FileEncoding::Text => (attachment.file_data.clone().into_bytes(), "text/plain"),
                FileEncoding::Base64 => (
                    base64::engine::general_purpose::STANDARD
                        .decode(attachment.file_data.as_bytes())
                        .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?,
                    "application/octet-stream",
                ),
            };
            let content_type = ContentType::parse(
                attachment.file_content_type.as_deref().unwrap_or(default_type),
            )
            .map_err(|e| DeliveryError::InvalidMessage(format!("invalid file_content_type: {}", e)))?;
            body = body.singlepart(
                MimeAttachment::new(attachment.file_name.clone()).body(data, content_type),
            );
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.title.clone())
            .multipart(body)
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl EmailDeliveryClient for SmtpEmailDeliveryClient {
    async fn send(
        &self,
        target: &SmtpTarget,
        message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        if self.approximate_size(message) > self.limits.size_limit {
            return Ok(DeliveryStatus::new(
                "413",
                format!("Email size larger than {}", self.limits.size_limit),
            ));
        }

        let email = self.build_email(target, message)?;
        match self.mailer.deliver(target, email).await {
            Ok(()) => {
                tracing::info!(account_id = %target.account_id, "email delivered");
                Ok(DeliveryStatus::new("200", "Success"))
            }
            Err(e) => {
                tracing::warn!(account_id = %target.account_id, error = %e, "email delivery failed");
                let code = match e {
                    SmtpFailure::Rejected(_) => "502",
                    SmtpFailure::Connect(_) => "503",
                    SmtpFailure::Timeout(_) => "408",
                    SmtpFailure::Other(_) => "424",
                };
                Ok(DeliveryStatus::new(code, format!("sendEmail Error, status:{}", e)))
            }
        }
    }
}
