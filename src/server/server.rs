use std::sync::Arc;
use anyhow::{anyhow, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use crate::cache::token_manager::TokenManager;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub tokens: Arc<TokenManager>,
}

impl AppState {
    pub fn new (metrics: &Metrics, tokens: Arc<TokenManager>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            tokens,
        }
    }
}

pub async fn router(settings_config: &SettingsConfig, tokens: Arc<TokenManager>) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, tokens);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Serve `/healthz` (and the metrics path when enabled) until ctrl-c.
pub async fn start(settings_config: &SettingsConfig, tokens: Arc<TokenManager>) -> Result<()> {
    let app = router(settings_config, tokens).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow!("cannot bind {}: {}", bind_addr, e))?;
    info!("listening on {}", bind_addr);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    metrics.up.set(0);

    Ok(())
}
