use std::net::IpAddr;
use std::sync::Arc;

use ipnet::IpNet;

use crate::domain::service::{HostPolicy, SettingsProvider};

/// DenyListHostPolicy は `host_deny_list` に基づいて送信先ホストを拒否する。
///
/// エントリはホスト名（大文字小文字を区別しない）、IP アドレス、CIDR のいずれか。
/// 名前解決は行わない。
pub struct DenyListHostPolicy {
    settings: Arc<dyn SettingsProvider>,
}

impl DenyListHostPolicy {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self { settings }
    }
}

impl HostPolicy for DenyListHostPolicy {
    fn is_host_denied(&self, host: &str) -> bool {
        let deny_list = self.settings.current().host_deny_list;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let ip = host.parse::<IpAddr>().ok();
        deny_list
            .iter()
            .any(|entry| entry_matches(entry.trim(), host, ip))
    }
}

fn entry_matches(entry: &str, host: &str, ip: Option<IpAddr>) -> bool {
    if entry.is_empty() {
        return false;
    }
    if let Some(ip) = ip {
        if let Ok(net) = entry.parse::<IpNet>() {
            return net.contains(&ip);
        }
        if let Ok(denied) = entry.parse::<IpAddr>() {
            return denied == ip;
        }
    }
    entry.eq_ignore_ascii_case(host)
}
