use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Metrics> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide metrics.
pub async fn get_metrics() -> &'static Metrics {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_refresh_requests: IntCounterVec,
    pub token_refresh_failures: IntCounterVec,
    pub token_refresh_duration: HistogramVec,
    pub token_cache_hits: IntCounterVec,

    // REST metrics
    pub rest_requests: IntCounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new_custom(Some("gcloud".into()), None).expect("valid registry prefix");

        let metrics = Self {
            token_refresh_requests: IntCounterVec::new(Opts::new("token_refresh_requests_total", "Token refresh attempts by credential type"), &["credential_type"]).expect("valid metric"),
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Token refresh failures by credential type"), &["credential_type"]).expect("valid metric"),
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Token refresh duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]), &["credential_type"]).expect("valid metric"),
            token_cache_hits: IntCounterVec::new(Opts::new("token_cache_hits_total", "Token requests served from cache"), &["credential_type"]).expect("valid metric"),
            rest_requests: IntCounterVec::new(Opts::new("rest_requests_total", "REST requests by method and status"), &["method", "status"]).expect("valid metric"),
            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let _ = reg.register(Box::new(metrics.token_refresh_requests.clone()));
        let _ = reg.register(Box::new(metrics.token_refresh_failures.clone()));
        let _ = reg.register(Box::new(metrics.token_refresh_duration.clone()));
        let _ = reg.register(Box::new(metrics.token_cache_hits.clone()));
        let _ = reg.register(Box::new(metrics.rest_requests.clone()));

        metrics
    }

    /// Text exposition of everything gathered so far.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
