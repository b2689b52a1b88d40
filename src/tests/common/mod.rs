// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::credentials::Credentials;
use crate::errors::AuthError;
use crate::sources::{FetchToken, FetchedToken};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Credentials whose identity endpoint is `identity_url` (a mock server).
pub fn credentials_for(identity_url: &str) -> Credentials {
    Credentials {
        identity_tenant_id: "acme".to_owned(),
        client_id: "svc-mcp@acme".to_owned(),
        client_secret: "s3cr3t".to_owned(),
        timeout_seconds: 5,
        subdomain: Some("acme".to_owned()),
        identity_url: Some(identity_url.to_owned()),
        api_url: None,
    }
}

pub fn fetched(access_token: &str, expires_in: Option<u64>) -> FetchedToken {
    FetchedToken { access_token: access_token.to_owned(), expires_in }
}

/// In-process token source: counts calls, optionally sleeps to widen race
/// windows, replays scripted results and otherwise issues `tok-<n>`.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    calls: AtomicUsize,
    delay: Duration,
    expires_in: Option<u64>,
    script: Mutex<VecDeque<Result<FetchedToken, AuthError>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self { expires_in: Some(3600), ..Default::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_expires_in(mut self, expires_in: Option<u64>) -> Self {
        self.expires_in = expires_in;
        self
    }

    pub fn then(self, result: Result<FetchedToken, AuthError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FetchToken for ScriptedSource {
    async fn fetch_token(&self) -> Result<FetchedToken, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.script.lock().unwrap().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        scripted.unwrap_or_else(|| Ok(fetched(&format!("tok-{}", n), self.expires_in)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
