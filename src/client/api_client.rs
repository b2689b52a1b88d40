use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::token_manager::{bearer_header, TokenManager};
use crate::client::guidance::{error_message, guidance_for};
use crate::config::credentials::Credentials;
use crate::errors::{ApiError, ConfigError};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::{Reauthenticate, RetrySettings};
use crate::sources::{FetchToken, PlatformTokenSource};

impl Reauthenticate for ApiError {
    fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// JSON client for the Privilege Cloud REST API.
///
/// Every request carries a bearer token from the shared `TokenManager`. A 401
/// invalidates the rejected token (unless another request already replaced
/// it) and the request is replayed with a fresh one, at most
/// `RetrySettings::max_retries` times per request.
#[derive(Debug, Clone)]
pub struct ApiClient<S = PlatformTokenSource> {
    http: Client,
    base_url: String,
    tokens: Arc<TokenManager<S>>,
    retry: RetrySettings,
}

impl ApiClient<PlatformTokenSource> {
    pub fn from_credentials(
        credentials: &Credentials,
        tokens: Arc<TokenManager>,
        retry: RetrySettings,
    ) -> Result<Self, ConfigError> {
        Self::new(
            credentials.api_base_url()?,
            tokens,
            retry,
            Duration::from_secs(credentials.timeout_seconds),
        )
    }
}

impl<S: FetchToken> ApiClient<S> {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<TokenManager<S>>,
        retry: RetrySettings,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, tokens, retry })
    }

    pub fn tokens(&self) -> &Arc<TokenManager<S>> {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    /// Send one logical request. Empty success bodies (e.g. 204) yield `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let (method, url) = (&method, url.as_str());
        let tokens = &self.tokens;
        // token sent by the latest attempt
        let last_sent: Mutex<Option<String>> = Mutex::new(None);
        let last_sent = &last_sent;

        self.retry
            .run_with_reauth(
                move |attempt| async move {
                    let token = tokens.get_valid_token().await?;
                    *last_sent.lock().await = Some(token.clone());
                    self.send_once(method, url, query, body, &token, attempt).await
                },
                move || async move {
                    get_metrics().await.api_reauth_retries.inc();
                    if let Some(rejected) = last_sent.lock().await.take() {
                        tokens.invalidate_if_current(&rejected).await;
                    }
                },
            )
            .await
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|_| ApiError::InvalidUrl { url: raw })
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: &str,
        attempt: u32,
    ) -> Result<Value, ApiError> {
        let headers = bearer_header(token)?;

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        get_metrics()
            .await
            .api_requests
            .with_label_values(&[method.as_str(), status.as_str()])
            .inc();
        debug!("{} {} -> {} (attempt {})", method, url, status, attempt);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized { attempts: attempt });
        }

        let text = response.text().await.map_err(ApiError::Network)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(status, &text),
                guidance: guidance_for(status),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode { reason: e.to_string() })
    }
}
