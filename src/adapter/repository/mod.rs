pub mod channel_config_in_memory;

pub use channel_config_in_memory::InMemoryChannelConfigRepository;
