pub mod channel_config;
pub mod channel_payload;
pub mod channel_type;
pub mod config_query;
pub mod delivery_result;
pub mod destination;
pub mod feature;
pub mod message;

pub use channel_config::{ChannelConfig, ChannelSummary, NotificationConfig};
pub use channel_payload::ChannelPayload;
pub use channel_type::ChannelType;
pub use delivery_result::{DeliveryResult, DeliveryStatus, EmailRecipientStatus};
pub use feature::Feature;
pub use message::MessageContent;
