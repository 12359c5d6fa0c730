use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use k1s0_notification_channel_server::adapter::handler::{self, AppState};
use k1s0_notification_channel_server::adapter::repository::InMemoryChannelConfigRepository;
use k1s0_notification_channel_server::domain::repository::ChannelConfigRepository;
use k1s0_notification_channel_server::domain::service::{
    ChannelRegistry, ConfigQueryEngine, HostPolicy, HtmlSanitizer,
};
use k1s0_notification_channel_server::infrastructure::config::Config;
use k1s0_notification_channel_server::infrastructure::delivery::{
    AwsSnsDeliveryClient, AwsSnsPublisher, EmailLimits, HttpClientOptions,
    HttpWebhookDeliveryClient, LettreSmtpMailer, ReqwestHttpTransport, SmtpEmailDeliveryClient,
    SnsClientOptions,
};
use k1s0_notification_channel_server::infrastructure::host_deny_list::DenyListHostPolicy;
use k1s0_notification_channel_server::infrastructure::html_sanitizer::AmmoniaSanitizer;
use k1s0_notification_channel_server::infrastructure::settings::LiveSettings;
use k1s0_notification_channel_server::infrastructure::telemetry;
use k1s0_notification_channel_server::usecase::{self, Transports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    // Telemetry
    telemetry::init_tracing(&cfg.log)?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting notification channel server"
    );

    let notification = cfg.notification;
    let policy = notification.policy()?;
    let settings = Arc::new(LiveSettings::new(notification.settings()));
    let tooltip_support = notification.tooltip_support;

    // Registry / repository
    let registry = Arc::new(ChannelRegistry::new());
    let engine = Arc::new(ConfigQueryEngine::new(registry.clone()));
    let repo: Arc<dyn ChannelConfigRepository> =
        Arc::new(InMemoryChannelConfigRepository::new(registry.clone()));
    info!(
        channel_types = registry.supported_types().len(),
        "using in-memory channel config repository"
    );

    // Transports
    let host_policy: Arc<dyn HostPolicy> = Arc::new(DenyListHostPolicy::new(settings.clone()));
    let http = ReqwestHttpTransport::new(HttpClientOptions {
        connect_timeout: notification.connection_timeout(),
        socket_timeout: notification.socket_timeout(),
        max_idle_per_host: notification.max_connections_per_route,
    })?;
    let sanitizer: Arc<dyn HtmlSanitizer> = Arc::new(AmmoniaSanitizer::new());
    let connect_timeout = notification.connection_timeout();
    let socket_timeout = notification.socket_timeout();
    let mailer = LettreSmtpMailer::new(notification.smtp_credentials, socket_timeout);
    let publisher = AwsSnsPublisher::new(SnsClientOptions {
        region: notification.sns.region.clone(),
        endpoint: notification.sns.endpoint.clone(),
        connect_timeout,
        socket_timeout,
    })
    .await;

    let transports = Transports {
        webhook: Arc::new(HttpWebhookDeliveryClient::new(Arc::new(http), host_policy)),
        email: Arc::new(SmtpEmailDeliveryClient::new(
            Arc::new(mailer),
            sanitizer,
            settings.clone(),
            EmailLimits {
                size_limit: notification.email_size_limit,
                minimum_header_length: notification.email_minimum_header_length,
            },
        )),
        sns: Arc::new(AwsSnsDeliveryClient::new(Arc::new(publisher))),
    };

    // Use cases
    let features_uc = usecase::GetPluginFeaturesUseCase::new(policy.clone(), tooltip_support);
    let validator = Arc::new(usecase::ConfigValidator::new(repo.clone(), policy));
    let send_message_uc = Arc::new(usecase::SendMessageUseCase::new(
        repo.clone(),
        registry.clone(),
        transports,
    ));
    let state = AppState {
        create_config_uc: Arc::new(usecase::CreateConfigUseCase::new(
            repo.clone(),
            registry.clone(),
            validator.clone(),
        )),
        update_config_uc: Arc::new(usecase::UpdateConfigUseCase::new(
            repo.clone(),
            registry.clone(),
            validator,
        )),
        delete_configs_uc: Arc::new(usecase::DeleteConfigsUseCase::new(repo.clone())),
        get_config_uc: Arc::new(usecase::GetConfigUseCase::new(repo.clone())),
        list_configs_uc: Arc::new(usecase::ListConfigsUseCase::new(repo.clone(), engine.clone())),
        get_channel_list_uc: Arc::new(usecase::GetChannelListUseCase::new(
            repo.clone(),
            registry.clone(),
            engine,
        )),
        send_test_message_uc: Arc::new(usecase::SendTestMessageUseCase::new(
            repo,
            send_message_uc.clone(),
        )),
        send_message_uc,
        get_plugin_features_uc: Arc::new(features_uc),
        settings_uc: Arc::new(usecase::SettingsUseCase::new(settings)),
        registry,
    };

    // Router
    let app = handler::router(state);

    let host: std::net::IpAddr = cfg.server.host.parse()?;
    let rest_addr = SocketAddr::new(host, cfg.server.port);
    info!("REST server starting on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("notification channel server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
