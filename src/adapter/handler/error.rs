use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ErrorResponse;
use crate::domain::service::ConfigError;
use crate::usecase::create_config::CreateConfigError;
use crate::usecase::delete_configs::DeleteConfigsError;
use crate::usecase::get_channel_list::GetChannelListError;
use crate::usecase::get_config::GetConfigError;
use crate::usecase::list_configs::ListConfigsError;
use crate::usecase::send_message::SendMessageError;
use crate::usecase::update_config::UpdateConfigError;

/// ApiError は REST API のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotAcceptable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidConfig(msg) => Self::BadRequest(msg),
            ConfigError::NotFound(msg) => Self::NotFound(msg),
            ConfigError::Conflict(msg) => Self::Conflict(msg),
            ConfigError::Forbidden(msg) => Self::Forbidden(msg),
            ConfigError::NotAcceptable(msg) => Self::NotAcceptable(msg),
            e @ ConfigError::UnsupportedOperation(_) => Self::Internal(e.to_string()),
        }
    }
}

macro_rules! impl_from_usecase_error {
    ($($err:ident),* $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    match err {
                        $err::Config(e) => e.into(),
                        $err::Internal(msg) => Self::Internal(msg),
                    }
                }
            }
        )*
    };
}

impl_from_usecase_error!(
    CreateConfigError,
    UpdateConfigError,
    DeleteConfigsError,
    GetConfigError,
    ListConfigsError,
    GetChannelListError,
);

impl From<SendMessageError> for ApiError {
    fn from(err: SendMessageError) -> Self {
        match err {
            SendMessageError::InvalidMessage(e) => Self::BadRequest(e.to_string()),
            SendMessageError::Config(e) => e.into(),
            SendMessageError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "SYS_NOTIFCH_VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "SYS_NOTIFCH_NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "SYS_NOTIFCH_CONFLICT"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "SYS_NOTIFCH_FORBIDDEN"),
            ApiError::NotAcceptable(_) => (StatusCode::NOT_ACCEPTABLE, "SYS_NOTIFCH_NOT_ACCEPTABLE"),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYS_NOTIFCH_INTERNAL_ERROR",
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse::new(code, &self.to_string());
        (status, Json(body)).into_response()
    }
}
