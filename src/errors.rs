//! Error types shared across the crate.
//!
//! Library code returns these typed errors; the binary folds them into
//! `anyhow::Error` at the top level.

use http::StatusCode;
use thiserror::Error;

/// Failure to obtain a bearer token from the identity provider.
///
/// Every acquisition failure collapses into exactly one of these variants.
/// `kind()` gives the stable tag used in logs and metrics.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider could not be reached (DNS, TCP, TLS, timeout).
    #[error("authentication failed: network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The identity provider answered with a non-2xx status.
    #[error("authentication failed: failed to authenticate: HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// 2xx response whose body could not be understood.
    #[error("authentication failed: invalid response format: {reason}")]
    InvalidResponseFormat { reason: String },

    /// Well-formed response without a usable `access_token`.
    #[error("authentication failed: missing access token in identity response")]
    MissingAccessToken,
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Network(_) => "network error",
            AuthError::HttpStatus { .. } => "failed to authenticate",
            AuthError::InvalidResponseFormat { .. } => "invalid response format",
            AuthError::MissingAccessToken => "missing access token",
        }
    }

    /// Label value for the fetch failure counter.
    pub fn metric_reason(&self) -> &'static str {
        match self {
            AuthError::Network(_) => "network",
            AuthError::HttpStatus { .. } => "http_status",
            AuthError::InvalidResponseFormat { .. } => "invalid_response",
            AuthError::MissingAccessToken => "missing_access_token",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AuthError::Network(err) if err.is_timeout())
    }
}

/// Invalid or incomplete configuration detected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingVariable { name: &'static str },

    #[error("invalid value {value:?} for environment variable {name}: {reason}")]
    InvalidVariable {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failure of an authenticated Privilege Cloud API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The API kept rejecting freshly acquired tokens.
    #[error("request unauthorized after {attempts} attempt(s); the service account may lack access or the token was revoked")]
    Unauthorized { attempts: u32 },

    #[error("HTTP {status}: {message}. {guidance}")]
    Status {
        status: StatusCode,
        message: String,
        guidance: &'static str,
    },

    #[error("network error calling Privilege Cloud API: {0}")]
    Network(#[source] reqwest::Error),

    #[error("could not decode API response: {reason}")]
    Decode { reason: String },

    #[error("invalid API url {url:?}")]
    InvalidUrl { url: String },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}
