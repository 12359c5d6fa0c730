//! テスト用の送信スタブと AppState 組み立てヘルパー。
//! 統合テスト（tests/integration_test.rs）から利用する。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::adapter::handler::AppState;
use crate::adapter::repository::InMemoryChannelConfigRepository;
use crate::domain::entity::delivery_result::DeliveryStatus;
use crate::domain::entity::destination::{SmtpTarget, SnsTarget, WebhookTarget};
use crate::domain::entity::message::MessageContent;
use crate::domain::repository::ChannelConfigRepository;
use crate::domain::service::{
    ChannelRegistry, ConfigQueryEngine, DeliveryError, EmailDeliveryClient, SnsDeliveryClient,
    WebhookDeliveryClient,
};
use crate::domain::service::NotificationSettings;
use crate::infrastructure::settings::LiveSettings;
use crate::usecase::{
    ConfigPolicy, ConfigValidator, CreateConfigUseCase, DeleteConfigsUseCase,
    GetChannelListUseCase, GetConfigUseCase, GetPluginFeaturesUseCase, ListConfigsUseCase,
    SendMessageUseCase, SendTestMessageUseCase, SettingsUseCase, Transports, UpdateConfigUseCase,
};

// ---------------------------------------------------------------------------
// Stub transports
// ---------------------------------------------------------------------------

/// 送信先を記録して固定ステータスを返す webhook スタブ。
pub struct StubWebhookClient {
    status: DeliveryStatus,
    sent: Mutex<Vec<WebhookTarget>>,
}

impl StubWebhookClient {
    pub fn returning(status: DeliveryStatus) -> Self {
        Self {
            status,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<WebhookTarget> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for StubWebhookClient {
    fn default() -> Self {
        Self::returning(DeliveryStatus::new("200", "{}"))
    }
}

#[async_trait]
impl WebhookDeliveryClient for StubWebhookClient {
    async fn send(
        &self,
        target: &WebhookTarget,
        _message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(target.clone());
        Ok(self.status.clone())
    }
}

/// 宛先ごとに成功を返すメールスタブ。
#[derive(Default)]
pub struct StubEmailClient {
    sent: Mutex<Vec<SmtpTarget>>,
}

impl StubEmailClient {
    pub fn sent(&self) -> Vec<SmtpTarget> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EmailDeliveryClient for StubEmailClient {
    async fn send(
        &self,
        target: &SmtpTarget,
        _message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(target.clone());
        Ok(DeliveryStatus::new("200", "Success"))
    }
}

/// 常に同じメッセージ ID で成功する SNS スタブ。
#[derive(Default)]
pub struct StubSnsClient;

#[async_trait]
impl SnsDeliveryClient for StubSnsClient {
    async fn send(
        &self,
        _target: &SnsTarget,
        _message: &MessageContent,
    ) -> Result<DeliveryStatus, DeliveryError> {
        Ok(DeliveryStatus::new("200", "Success:stub-message-id"))
    }
}

/// 既定のスタブ一式。
pub fn stub_transports() -> Transports {
    Transports {
        webhook: Arc::new(StubWebhookClient::default()),
        email: Arc::new(StubEmailClient::default()),
        sns: Arc::new(StubSnsClient),
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// インメモリリポジトリを使う AppState を生成する。
pub fn make_test_app_state(
    repo: Arc<dyn ChannelConfigRepository>,
    transports: Transports,
    policy: ConfigPolicy,
) -> AppState {
    let settings = Arc::new(LiveSettings::new(NotificationSettings::default()));
    make_test_app_state_with_settings(repo, transports, policy, settings)
}

/// 送信設定を外から渡して AppState を生成する。
/// 送信スタブ側と同じ LiveSettings を共有させたいテストで使う。
pub fn make_test_app_state_with_settings(
    repo: Arc<dyn ChannelConfigRepository>,
    transports: Transports,
    policy: ConfigPolicy,
    settings: Arc<LiveSettings>,
) -> AppState {
    let registry = Arc::new(ChannelRegistry::new());
    let engine = Arc::new(ConfigQueryEngine::new(registry.clone()));
    let features_uc = GetPluginFeaturesUseCase::new(policy.clone(), true);
    let validator = Arc::new(ConfigValidator::new(repo.clone(), policy));
    let send_message_uc = Arc::new(SendMessageUseCase::new(
        repo.clone(),
        registry.clone(),
        transports,
    ));

    AppState {
        create_config_uc: Arc::new(CreateConfigUseCase::new(
            repo.clone(),
            registry.clone(),
            validator.clone(),
        )),
        update_config_uc: Arc::new(UpdateConfigUseCase::new(
            repo.clone(),
            registry.clone(),
            validator,
        )),
        delete_configs_uc: Arc::new(DeleteConfigsUseCase::new(repo.clone())),
        get_config_uc: Arc::new(GetConfigUseCase::new(repo.clone())),
        list_configs_uc: Arc::new(ListConfigsUseCase::new(repo.clone(), engine.clone())),
        get_channel_list_uc: Arc::new(GetChannelListUseCase::new(
            repo.clone(),
            registry.clone(),
            engine,
        )),
        send_test_message_uc: Arc::new(SendTestMessageUseCase::new(repo, send_message_uc.clone())),
        send_message_uc,
        get_plugin_features_uc: Arc::new(features_uc),
        settings_uc: Arc::new(SettingsUseCase::new(settings)),
        registry,
    }
}

/// 新しいインメモリリポジトリとそのリポジトリを使う AppState を生成する。
pub fn make_in_memory_app_state(transports: Transports) -> (AppState, Arc<InMemoryChannelConfigRepository>) {
    let repo = Arc::new(InMemoryChannelConfigRepository::new(Arc::new(
        ChannelRegistry::new(),
    )));
    let state = make_test_app_state(repo.clone(), transports, ConfigPolicy::default());
    (state, repo)
}

/// make_in_memory_app_state と同じだが、送信設定を共有する。
pub fn make_in_memory_app_state_with_settings(
    transports: Transports,
    settings: Arc<LiveSettings>,
) -> (AppState, Arc<InMemoryChannelConfigRepository>) {
    let repo = Arc::new(InMemoryChannelConfigRepository::new(Arc::new(
        ChannelRegistry::new(),
    )));
    let state =
        make_test_app_state_with_settings(repo.clone(), transports, ConfigPolicy::default(), settings);
    (state, repo)
}
