pub mod channel_descriptor;
pub mod channel_kinds;
pub mod channel_registry;
pub mod channel_validation;
pub mod config_query_engine;
pub mod delivery_client;
pub mod host_policy;
pub mod html_sanitizer;
pub mod settings_provider;

pub use channel_descriptor::{ChannelDescriptor, DeliveryFamily};
pub use channel_registry::ChannelRegistry;
pub use channel_validation::ConfigError;
pub use config_query_engine::ConfigQueryEngine;
pub use delivery_client::{
    DeliveryError, EmailDeliveryClient, SnsDeliveryClient, WebhookDeliveryClient,
};
pub use host_policy::HostPolicy;
pub use html_sanitizer::HtmlSanitizer;
pub use settings_provider::{NotificationSettings, SettingsProvider, SettingsStore};
