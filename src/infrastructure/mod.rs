pub mod config;
pub mod delivery;
pub mod host_deny_list;
pub mod html_sanitizer;
pub mod settings;
pub mod telemetry;
