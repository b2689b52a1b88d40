use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Process-wide metrics registry, created on first use.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token manager
    pub token_requests: IntCounterVec,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: HistogramVec,
    pub token_expiry_unix: IntGauge,
    pub token_invalidations: IntCounter,

    // Request layer
    pub api_requests: IntCounterVec,
    pub api_reauth_retries: IntCounter,

    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("cyberarkauth".into()), None)
            .unwrap_or_default();

        let metrics: Arc<Metrics> = Arc::new(Self {
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Token requests by outcome (cache_hit, refresh)"),&["outcome"],).unwrap(),
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Token fetch failures by reason"),&["source", "reason"],).unwrap(),
            token_fetch_duration: HistogramVec::new(HistogramOpts::new("token_fetch_duration_seconds", "Token fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),&["source"],).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached token (UNIX seconds)").unwrap(),
            token_invalidations: IntCounter::new("token_invalidations_total", "Forced token invalidations").unwrap(),

            api_requests: IntCounterVec::new(Opts::new("api_requests_total", "Privilege Cloud API responses by method and status"),&["method", "status"],).unwrap(),
            api_reauth_retries: IntCounter::new("api_reauth_retries_total", "API requests retried after a 401").unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.token_invalidations.clone())).unwrap();
        reg.register(Box::new(metrics.api_requests.clone())).unwrap();
        reg.register(Box::new(metrics.api_reauth_retries.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
