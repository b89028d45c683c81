use std::time::Duration;

use batch_logging::batch_debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use url::Url;

use crate::types::{ApiEnvelope, ApiResult};
use crate::{FailureKind, SendError, SendReceipt, SmsSendRequest, TemplateSummary};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub send_path: String,
    pub template_path: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            send_path: "/api/sender/smser/message_send".to_string(),
            template_path: "/api/sender/smser/tpl_config_list".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiSettings {
    fn endpoint(&self, path: &str) -> Result<Url, SendError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|err| SendError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

/// Client side of the remote SMS API.
#[async_trait::async_trait]
pub trait SmsApi: Send + Sync {
    async fn send(&self, request: &SmsSendRequest) -> Result<SendReceipt, SendError>;

    async fn list_templates(&self, user_id: u64) -> Result<Vec<TemplateSummary>, SendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSmsApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestSmsApi {
    pub fn new(settings: ApiSettings) -> Result<Self, SendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = settings.auth_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| SendError::new(FailureKind::InvalidAuthToken, err.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| SendError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { settings, client })
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(ApiResult, Option<serde_json::Value>), SendError> {
        let url = self.settings.endpoint(path)?;
        batch_debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|err| SendError::new(FailureKind::Decode, err.to_string()))?;

        if !envelope.result.is_ok() {
            let ApiResult {
                code,
                state,
                message,
            } = envelope.result;
            return Err(SendError::new(FailureKind::Rejected { code, state }, message));
        }
        Ok((envelope.result, envelope.response))
    }
}

#[async_trait::async_trait]
impl SmsApi for ReqwestSmsApi {
    async fn send(&self, request: &SmsSendRequest) -> Result<SendReceipt, SendError> {
        let (result, _) = self.call(&self.settings.send_path, request).await?;
        Ok(SendReceipt {
            message: result.message,
        })
    }

    async fn list_templates(&self, user_id: u64) -> Result<Vec<TemplateSummary>, SendError> {
        #[derive(Serialize)]
        struct ListParam {
            user_id: u64,
        }

        let (_, response) = self
            .call(&self.settings.template_path, &ListParam { user_id })
            .await?;
        let data = response
            .and_then(|mut value| value.get_mut("data").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Array(Vec::new()));
        serde_json::from_value(data)
            .map_err(|err| SendError::new(FailureKind::Decode, err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SendError {
    if err.is_timeout() {
        return SendError::new(FailureKind::Timeout, err.to_string());
    }
    SendError::new(FailureKind::Network, err.to_string())
}
