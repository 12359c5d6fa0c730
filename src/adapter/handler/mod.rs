pub mod channel_config_handler;
pub mod error;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::domain::service::ChannelRegistry;
use crate::usecase::{
    CreateConfigUseCase, DeleteConfigsUseCase, GetChannelListUseCase, GetConfigUseCase,
    GetPluginFeaturesUseCase, ListConfigsUseCase, SendMessageUseCase, SendTestMessageUseCase,
    SettingsUseCase, UpdateConfigUseCase,
};

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub create_config_uc: Arc<CreateConfigUseCase>,
    pub update_config_uc: Arc<UpdateConfigUseCase>,
    pub delete_configs_uc: Arc<DeleteConfigsUseCase>,
    pub get_config_uc: Arc<GetConfigUseCase>,
    pub list_configs_uc: Arc<ListConfigsUseCase>,
    pub get_channel_list_uc: Arc<GetChannelListUseCase>,
    pub send_message_uc: Arc<SendMessageUseCase>,
    pub send_test_message_uc: Arc<SendTestMessageUseCase>,
    pub get_plugin_features_uc: Arc<GetPluginFeaturesUseCase>,
    pub settings_uc: Arc<SettingsUseCase>,
    pub registry: Arc<ChannelRegistry>,
}

/// REST API ルーターを構築する。
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(channel_config_handler::healthz))
        .route("/readyz", get(channel_config_handler::readyz))
        .route(
            "/api/v1/configs",
            post(channel_config_handler::create_config)
                .get(channel_config_handler::get_configs)
                .delete(channel_config_handler::delete_configs),
        )
        .route(
            "/api/v1/configs/{id}",
            get(channel_config_handler::get_config)
                .put(channel_config_handler::update_config)
                .delete(channel_config_handler::delete_config),
        )
        .route(
            "/api/v1/configs/{id}/test",
            post(channel_config_handler::send_test_message),
        )
        .route("/api/v1/channels", get(channel_config_handler::list_channels))
        .route(
            "/api/v1/features/{feature}/channels",
            get(channel_config_handler::list_feature_channels),
        )
        .route("/api/v1/send", post(channel_config_handler::send_message))
        .route("/api/v1/features", get(channel_config_handler::get_plugin_features))
        .route(
            "/api/v1/settings",
            get(channel_config_handler::get_settings).put(channel_config_handler::update_settings),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ErrorResponse は統一エラーレスポンス。
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                request_id: uuid::Uuid::new_v4().to_string(),
                details: vec![],
            },
        }
    }
}
