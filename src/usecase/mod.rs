pub mod config_validator;
pub mod create_config;
pub mod delete_configs;
pub mod get_channel_list;
pub mod get_config;
pub mod get_plugin_features;
pub mod list_configs;
pub mod send_message;
pub mod send_test_message;
pub mod update_config;
pub mod update_settings;

pub use config_validator::{ConfigPolicy, ConfigValidator};
pub use create_config::CreateConfigUseCase;
pub use delete_configs::DeleteConfigsUseCase;
pub use get_channel_list::GetChannelListUseCase;
pub use get_config::GetConfigUseCase;
pub use get_plugin_features::GetPluginFeaturesUseCase;
pub use list_configs::ListConfigsUseCase;
pub use send_message::{SendMessageUseCase, Transports};
pub use send_test_message::SendTestMessageUseCase;
pub use update_config::UpdateConfigUseCase;
pub use update_settings::SettingsUseCase;
