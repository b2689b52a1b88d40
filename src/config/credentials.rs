use std::env;

use crate::errors::ConfigError;
use crate::utils::constants::*;

/// Service-account credentials and endpoint overrides, sourced from the
/// environment and validated up front.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity_tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_seconds: u64,
    pub subdomain: Option<String>,
    /// Replaces `https://{tenant}.id.cyberark.cloud` when set.
    pub identity_url: Option<String>,
    /// Replaces the Privilege Cloud API base url when set.
    pub api_url: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup. Blank values count as unset. Values are
    /// trimmed, except the client secret which is kept byte for byte.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let verbatim = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());
        let optional = |name: &'static str| verbatim(name).map(|value| value.trim().to_owned());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::MissingVariable { name });

        Ok(Self {
            identity_tenant_id: required(ENV_IDENTITY_TENANT_ID)?,
            client_id: required(ENV_CLIENT_ID)?,
            client_secret: verbatim(ENV_CLIENT_SECRET).ok_or(ConfigError::MissingVariable { name: ENV_CLIENT_SECRET })?,
            timeout_seconds: match optional(ENV_TIMEOUT) {
                None => DEFAULT_TIMEOUT_SECS,
                Some(raw) => parse_timeout(&raw)?,
            },
            subdomain: optional(ENV_SUBDOMAIN),
            identity_url: optional(ENV_IDENTITY_URL),
            api_url: optional(ENV_API_URL),
        })
    }

    /// Base url of the Privilege Cloud REST API, if one can be derived.
    pub fn api_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.api_url {
            return Ok(url.trim_end_matches('/').to_owned());
        }
        self.subdomain
            .as_ref()
            .map(|subdomain| format!("https://{}.{}{}", subdomain, PRIVILEGE_CLOUD_DOMAIN, PRIVILEGE_CLOUD_API_PATH))
            .ok_or(ConfigError::MissingVariable { name: ENV_SUBDOMAIN })
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidVariable {
        name: ENV_TIMEOUT,
        value: raw.to_owned(),
        reason: reason.to_owned(),
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid("timeout must be at least 1 second")),
        Ok(seconds) => Ok(seconds),
        Err(e) => Err(invalid(&e.to_string())),
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity_tenant_id", &self.identity_tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("subdomain", &self.subdomain)
            .field("identity_url", &self.identity_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}
