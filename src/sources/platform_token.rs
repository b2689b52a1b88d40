use std::time::Duration;

use http::HeaderValue;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::credentials::Credentials;
use crate::errors::{AuthError, ConfigError};
use crate::sources::{FetchToken, FetchedToken};
use crate::utils::constants::{IDENTITY_DOMAIN, PLATFORM_TOKEN_PATH};

/// Cap on how much of an error body is carried into `AuthError::HttpStatus`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Platform token endpoint for a tenant.
pub fn token_endpoint(identity_tenant_id: &str) -> String {
    format!("https://{}.{}{}", identity_tenant_id, IDENTITY_DOMAIN, PLATFORM_TOKEN_PATH)
}

#[derive(Debug, Deserialize)]
struct PlatformTokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Client-credentials grant against the CyberArk Identity platform token endpoint.
#[derive(Clone)]
pub struct PlatformTokenSource {
    client: Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
}

impl PlatformTokenSource {
    pub fn new(credentials: &Credentials) -> Result<Self, ConfigError> {
        let endpoint = match &credentials.identity_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), PLATFORM_TOKEN_PATH),
            None => token_endpoint(&credentials.identity_tenant_id),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(credentials.timeout_seconds))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            endpoint,
            client_id: credentials.client_id.to_owned(),
            client_secret: credentials.client_secret.to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for PlatformTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformTokenSource")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl FetchToken for PlatformTokenSource {
    async fn fetch_token(&self) -> Result<FetchedToken, AuthError> {
        debug!("requesting platform token from {}", self.endpoint);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(AuthError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Network)?;

        if !status.is_success() {
            warn!("identity provider rejected token request: HTTP {}", status);
            return Err(AuthError::HttpStatus {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        parse_token_response(&body)
    }

    fn name(&self) -> &str {
        "platform_token"
    }
}

/// Interpret a 2xx token endpoint body.
pub fn parse_token_response(body: &str) -> Result<FetchedToken, AuthError> {
    let parsed: PlatformTokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::InvalidResponseFormat { reason: e.to_string() })?;

    let access_token = parsed
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingAccessToken)?;

    // the token ends up in an Authorization header, reject anything that cannot
    if HeaderValue::from_str(&access_token).is_err() {
        return Err(AuthError::InvalidResponseFormat {
            reason: "access_token contains characters not allowed in an HTTP header".to_owned(),
        });
    }

    Ok(FetchedToken {
        access_token,
        expires_in: parsed.expires_in,
    })
}
