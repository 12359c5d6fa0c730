use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::infrastructure::config::LogConfig;

/// init_tracing は tracing-subscriber を初期化する。
/// `RUST_LOG` が設定されていれば設定ファイルのレベルより優先する。
pub fn init_tracing(cfg: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let registry = tracing_subscriber::registry().with(filter);

    if cfg.format == "text" {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    }
    Ok(())
}
