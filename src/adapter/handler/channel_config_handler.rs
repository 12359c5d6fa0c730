use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::domain::entity::channel_config::{ChannelConfig, ChannelSummary};
use crate::domain::entity::config_query::{ConfigQueryRequest, SortOrder};
use crate::domain::entity::delivery_result::DeliveryResult;
use crate::domain::entity::feature::Feature;
use crate::domain::entity::message::MessageContent;
use crate::domain::service::NotificationSettings;
use crate::usecase::create_config::CreateConfigInput;
use crate::usecase::get_plugin_features::PluginFeatures;
use crate::usecase::send_message::SendMessageInput;
use crate::usecase::update_config::UpdateConfigInput;
use crate::usecase::update_settings::UpdateSettingsInput;

const CONFIG_ID_LIST: &str = "config_id_list";
const FROM_INDEX: &str = "from_index";
const MAX_ITEMS: &str = "max_items";
const SORT_FIELD: &str = "sort_field";
const SORT_ORDER: &str = "sort_order";

// --- Request / Response DTOs ---

#[derive(Debug, Deserialize)]
pub struct CreateConfigRequest {
    pub config_id: Option<String>,
    pub config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub config: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ConfigIdResponse {
    pub config_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigListResponse {
    pub start_index: usize,
    pub total_hits: usize,
    pub config_list: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub delete_response_list: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ChannelListResponse {
    pub channel_list: Vec<ChannelSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub channel_ids: Vec<String>,
    pub message: MessageContent,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub delivery_results: Vec<DeliveryResult>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub email_html_sanitization_enabled: Option<bool>,
    pub email_html_sanitization_allow_list: Option<Vec<String>>,
    pub email_html_sanitization_deny_list: Option<Vec<String>>,
    pub host_deny_list: Option<Vec<String>>,
}

// --- Handlers ---

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn readyz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ready"}))
}

pub async fn create_config(
    State(state): State<AppState>,
    Json(req): Json<CreateConfigRequest>,
) -> Result<(StatusCode, Json<ConfigIdResponse>), ApiError> {
    let input = CreateConfigInput {
        config_id: req.config_id,
        config: req.config,
    };
    let doc = state.create_config_uc.execute(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConfigIdResponse {
            config_id: doc.config_id,
        }),
    ))
}

pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<Json<ConfigIdResponse>, ApiError> {
    let input = UpdateConfigInput {
        config_id: id,
        config: req.config,
    };
    let doc = state.update_config_uc.execute(&input).await?;
    Ok(Json(ConfigIdResponse {
        config_id: doc.config_id,
    }))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let doc = state.get_config_uc.execute(&id).await?;
    Ok(Json(state.registry.document_to_json(&doc)?))
}

/// `config_id_list` があれば複数取得、なければクエリ文字列をフィルタとして検索する。
pub async fn get_configs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ConfigListResponse>, ApiError> {
    if let Some(list) = params.get(CONFIG_ID_LIST) {
        let ids = split_ids(list);
        let docs = state.get_config_uc.execute_many(&ids).await?;
        return Ok(Json(to_list_response(&state, 0, docs.len(), &docs)?));
    }

    let request = query_request(params)?;
    let start_index = request.from_index.unwrap_or(0);
    let page = state.list_configs_uc.execute(&request).await?;
    Ok(Json(to_list_response(
        &state,
        start_index,
        page.total_hits,
        &page.configs,
    )?))
}

pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let result = state.delete_configs_uc.execute(&[id]).await?;
    Ok(Json(DeleteResponse {
        delete_response_list: result,
    }))
}

pub async fn delete_configs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let ids = params
        .get(CONFIG_ID_LIST)
        .map(|list| split_ids(list))
        .unwrap_or_default();
    let result = state.delete_configs_uc.execute(&ids).await?;
    Ok(Json(DeleteResponse {
        delete_response_list: result,
    }))
}

pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let channel_list = state.get_channel_list_uc.execute().await?;
    Ok(Json(ChannelListResponse { channel_list }))
}

pub async fn list_feature_channels(
    State(state): State<AppState>,
    Path(feature): Path<String>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let feature = Feature::from_tag(&feature)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid feature {}", feature)))?;
    let channel_list = state.get_channel_list_uc.execute_for_feature(feature).await?;
    Ok(Json(ChannelListResponse { channel_list }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let input = SendMessageInput {
        channel_ids: req.channel_ids,
        message: req.message,
    };
    let delivery_results = state.send_message_uc.execute(&input).await?;
    Ok(Json(SendMessageResponse { delivery_results }))
}

/// 保存済みの設定 1 件にテストメッセージを送る。
pub async fn send_test_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let delivery_results = state.send_test_message_uc.execute(&id).await?;
    Ok(Json(SendMessageResponse { delivery_results }))
}

pub async fn get_plugin_features(State(state): State<AppState>) -> Json<PluginFeatures> {
    Json(state.get_plugin_features_uc.execute())
}

pub async fn get_settings(State(state): State<AppState>) -> Json<NotificationSettings> {
    Json(state.settings_uc.current())
}

/// 送信時に参照する設定を実行中に差し替える。指定しなかった項目は現在値のまま。
pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<NotificationSettings>, ApiError> {
    let input = UpdateSettingsInput {
        email_html_sanitization_enabled: req.email_html_sanitization_enabled,
        email_html_sanitization_allow_list: req.email_html_sanitization_allow_list,
        email_html_sanitization_deny_list: req.email_html_sanitization_deny_list,
        host_deny_list: req.host_deny_list,
    };
    let settings = state.settings_uc.update(&input)?;
    Ok(Json(settings))
}

// --- Helpers ---

fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_index(params: &HashMap<String, String>, key: &str) -> Result<Option<usize>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", key)))
        })
        .transpose()
}

fn query_request(mut params: HashMap<String, String>) -> Result<ConfigQueryRequest, ApiError> {
    let from_index = parse_index(&params, FROM_INDEX)?;
    let max_items = parse_index(&params, MAX_ITEMS)?;
    let sort_order = match params.get(SORT_ORDER).map(|s| s.to_ascii_lowercase()) {
        None => None,
        Some(order) if order == "asc" => Some(SortOrder::Asc),
        Some(order) if order == "desc" => Some(SortOrder::Desc),
        Some(order) => {
            return Err(ApiError::BadRequest(format!(
                "sort_order must be asc or desc, got {}",
                order
            )))
        }
    };
    let sort_field = params.remove(SORT_FIELD);
    for key in [FROM_INDEX, MAX_ITEMS, SORT_ORDER] {
        params.remove(key);
    }

    Ok(ConfigQueryRequest {
        filter_params: params.into_iter().collect(),
        sort_field,
        sort_order,
        from_index,
        max_items,
    })
}

fn to_list_response(
    state: &AppState,
    start_index: usize,
    total_hits: usize,
    docs: &[ChannelConfig],
) -> Result<ConfigListResponse, ApiError> {
    let config_list = docs
        .iter()
        .map(|doc| state.registry.document_to_json(doc))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConfigListResponse {
        start_index,
        total_hits,
        config_list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_settings_request_is_partial_and_strict() {
        let req: UpdateSettingsRequest =
            serde_json::from_value(serde_json::json!({"host_deny_list": ["a"]})).unwrap();
        assert_eq!(req.host_deny_list, Some(vec!["a".to_string()]));
        assert!(req.email_html_sanitization_enabled.is_none());

        let typo = serde_json::from_value::<UpdateSettingsRequest>(
            serde_json::json!({"host_denylist": ["a"]}),
        );
        assert!(typo.is_err());
    }

    #[test]
    fn test_split_ids() {
        assert_eq!(split_ids("a, b,,c"), vec!["a", "b", "c"]);
        assert!(split_ids("").is_empty());
    }

    #[test]
    fn test_query_request_separates_paging_from_filters() {
        let params: HashMap<String, String> = [
            ("from_index", "10"),
            ("max_items", "5"),
            ("sort_field", "name"),
            ("sort_order", "DESC"),
            ("config_type", "slack,chime"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let req = query_request(params).unwrap();
        assert_eq!(req.from_index, Some(10));
        assert_eq!(req.max_items, Some(5));
        assert_eq!(req.sort_field.as_deref(), Some("name"));
        assert_eq!(req.sort_order, Some(SortOrder::Desc));
        assert_eq!(req.filter_params.len(), 1);
        assert_eq!(req.filter_params["config_type"], "slack,chime");
    }

    #[test]
    fn test_query_request_rejects_bad_paging() {
        let params: HashMap<String, String> =
            [("from_index".to_string(), "-1".to_string())].into_iter().collect();
        assert!(matches!(query_request(params), Err(ApiError::BadRequest(_))));

        let params: HashMap<String, String> =
            [("sort_order".to_string(), "up".to_string())].into_iter().collect();
        assert!(matches!(query_request(params), Err(ApiError::BadRequest(_))));
    }
}
