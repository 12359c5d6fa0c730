/// HostPolicy は送信先ホストの拒否判定を表す。
#[cfg_attr(test, mockall::automock)]
pub trait HostPolicy: Send + Sync {
    fn is_host_denied(&self, host: &str) -> bool;
}
