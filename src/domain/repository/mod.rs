pub mod channel_config_repository;

pub use channel_config_repository::ChannelConfigRepository;
