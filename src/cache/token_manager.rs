use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::{seconds, Token};
use crate::config::credentials::Credentials;
use crate::errors::{AuthError, ConfigError};
use crate::helpers::secret::mask;
use crate::helpers::time::{get_instant, system_clock, Clock};
use crate::observability::metrics::get_metrics;
use crate::sources::{FetchToken, PlatformTokenSource};
use crate::utils::constants::DEFAULT_SAFETY_MARGIN_SECS;

static CACHE_HIT: &str = "cache_hit";
static REFRESH: &str = "refresh";

/// Hands out a currently valid bearer token, refreshing it when needed.
///
/// The cached token lives behind a single `tokio::sync::Mutex`. The lock is
/// held across "check validity, fetch if needed, store", so concurrent
/// callers that find the cache stale queue behind the first one and reuse
/// the token it stores instead of issuing their own request. Cache hits take
/// the lock too.
///
/// Failed fetches leave the cache exactly as it was. Dropping a caller's
/// future mid-fetch releases the lock and likewise leaves the cache alone.
#[derive(Debug)]
pub struct TokenManager<S = PlatformTokenSource> {
    source: S,
    clock: Arc<dyn Clock>,
    safety_margin: TimeDelta,
    cached: Mutex<Option<Token>>,
}

impl TokenManager<PlatformTokenSource> {
    /// Manager for the platform token endpoint described by `credentials`.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self, ConfigError> {
        Ok(Self::new(PlatformTokenSource::new(credentials)?))
    }

    /// Reads credentials from the `CYBERARK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_credentials(&Credentials::from_env()?)
    }
}

impl<S: FetchToken> TokenManager<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            clock: system_clock(),
            safety_margin: seconds(DEFAULT_SAFETY_MARGIN_SECS),
            cached: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_safety_margin_seconds(mut self, secs: u64) -> Self {
        self.safety_margin = seconds(secs);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn safety_margin(&self) -> TimeDelta {
        self.safety_margin
    }

    /// Return the cached token if still valid, otherwise fetch, cache and
    /// return a new one.
    pub async fn get_valid_token(&self) -> Result<String, AuthError> {
        let metrics = get_metrics().await;
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached
            .as_ref()
            .filter(|token| token.is_valid(self.clock.now(), self.safety_margin))
        {
            metrics.token_requests.with_label_values(&[CACHE_HIT]).inc();
            return Ok(token.value.to_owned());
        }

        metrics.token_requests.with_label_values(&[REFRESH]).inc();
        match cached.as_ref() {
            Some(stale) => info!("token expiring at {} is inside the safety margin, refreshing", stale.expires_at),
            None => info!("no cached token, fetching from '{}'", self.source.name()),
        }

        let start = get_instant();
        let fetched = self.source.fetch_token().await;
        metrics
            .token_fetch_duration
            .with_label_values(&[self.source.name()])
            .observe(start.elapsed().as_secs_f64());

        let fetched = fetched.inspect_err(|err| {
            metrics
                .token_fetch_failures
                .with_label_values(&[self.source.name(), err.metric_reason()])
                .inc();
            warn!("token fetch failed ({}): {}", err.kind(), err);
        })?;

        let token = Token::issued(fetched.access_token, self.clock.now(), fetched.expires_in);
        metrics.token_expiry_unix.set(token.expires_at.timestamp());
        info!("token {} cached until {}", mask(&token.value), token.expires_at);

        let value = token.value.to_owned();
        *cached = Some(token);
        Ok(value)
    }

    /// `Authorization: Bearer <token>` for the current valid token.
    pub async fn get_auth_header(&self) -> Result<HeaderMap, AuthError> {
        bearer_header(&self.get_valid_token().await?)
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        let previous = self.cached.lock().await.take();
        let metrics = get_metrics().await;
        metrics.token_invalidations.inc();
        metrics.token_expiry_unix.set(0);
        match previous {
            Some(token) => info!("token {} invalidated", mask(&token.value)),
            None => debug!("invalidate called with empty token cache"),
        }
    }

    /// Drop the cached token only if it is still `rejected`. Callers that saw
    /// the same token rejected concurrently leave a refreshed token in place.
    /// Returns whether the cache was cleared.
    pub async fn invalidate_if_current(&self, rejected: &str) -> bool {
        let mut cached = self.cached.lock().await;
        if !matches!(cached.as_ref(), Some(token) if token.value == rejected) {
            debug!("token {} already replaced, keeping cache", mask(rejected));
            return false;
        }
        *cached = None;
        drop(cached);

        let metrics = get_metrics().await;
        metrics.token_invalidations.inc();
        metrics.token_expiry_unix.set(0);
        info!("token {} invalidated", mask(rejected));
        true
    }

    pub async fn has_valid_token(&self) -> bool {
        self.cached
            .lock()
            .await
            .as_ref()
            .is_some_and(|token| token.is_valid(self.clock.now(), self.safety_margin))
    }

    /// Expiry of the cached token, valid or not.
    pub async fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.cached.lock().await.as_ref().map(|token| token.expires_at)
    }
}

/// `Authorization: Bearer <token>` header map with the value marked sensitive.
pub fn bearer_header(token: &str) -> Result<HeaderMap, AuthError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| AuthError::InvalidResponseFormat { reason: e.to_string() })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
