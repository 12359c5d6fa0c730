pub mod email_client;
pub mod http_client;
pub mod sns_client;
pub mod webhook_client;

pub use email_client::{EmailLimits, LettreSmtpMailer, SmtpEmailDeliveryClient};
pub use http_client::{HttpClientOptions, ReqwestHttpTransport};
pub use sns_client::{AwsSnsDeliveryClient, AwsSnsPublisher, SnsClientOptions};
pub use webhook_client::HttpWebhookDeliveryClient;
