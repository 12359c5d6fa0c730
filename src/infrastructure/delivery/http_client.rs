use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

/// HttpRequest は webhook 送信 1 回分の HTTP リクエストを表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// HttpReply は受信したステータスと本文。
///
/// 本文を持ち得ないレスポンス (204, 205, 304 と HEAD への応答) の場合は `None`。
/// 本文が空でも持ち得るレスポンスなら `Some("")` になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpFailure {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for HttpFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// HttpTransport は HTTP 呼び出しを抽象化する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpReply, HttpFailure>;
}

/// HttpClientOptions は接続プールとタイムアウトの設定。
#[derive(Debug, Clone, Copy)]
pub struct HttpClientOptions {
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
    pub max_idle_per_host: usize,
}

/// ReqwestHttpTransport は reqwest による HttpTransport 実装。リトライは行わない。
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
}

impl ReqwestHttpTransport {
    pub fn new(options: HttpClientOptions) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.socket_timeout)
            .pool_max_idle_per_host(options.max_idle_per_host)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpReply, HttpFailure> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| HttpFailure::Other(format!("invalid method {}: {}", request.method, e)))?;

        let head = method == reqwest::Method::HEAD;
        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        if head || !status_carries_body(status) {
            return Ok(HttpReply { status, body: None });
        }
        let body = response.text().await?;
        Ok(HttpReply {
            status,
            body: Some(body),
        })
    }
}

fn status_carries_body(status: u16) -> bool {
    !matches!(status, 204 | 205 | 304)
}
