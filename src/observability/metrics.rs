use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
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
    pub token_refreshes: IntCounter,
    pub token_refresh_failures: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Resource fetch metrics
    pub fetch_requests: IntCounterVec,
    pub fetch_failures: IntCounterVec,
    pub fetch_duration: HistogramVec,
    pub fetch_skipped_links: IntCounter,

    // Sink metrics
    pub sink_dispatches: IntCounterVec,
    pub sink_records: IntCounterVec,
    pub sink_failures: IntCounterVec,

    // Traversal
    pub branch_failures: IntCounterVec,
    pub import_runs: IntCounterVec,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tacsimport".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_refreshes: IntCounter::new("token_refreshes_total", "Token requests issued to the token endpoint").unwrap(),
            token_refresh_failures: IntCounter::new("token_refresh_failures_total", "Failed token requests").unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached token").unwrap(),

            // Fetch
            fetch_requests: IntCounterVec::new(Opts::new("fetch_requests_total", "GET requests by resource"), &["resource"]).unwrap(),
            fetch_failures: IntCounterVec::new(Opts::new("fetch_failures_total", "Failed GET requests by resource and reason"), &["resource", "reason"]).unwrap(),
            fetch_duration: HistogramVec::new(HistogramOpts::new("fetch_duration_seconds", "GET duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["resource"]).unwrap(),
            fetch_skipped_links: IntCounter::new("fetch_skipped_links_total", "Null or empty links short-circuited without a request").unwrap(),

            // Sink
            sink_dispatches: IntCounterVec::new(Opts::new("sink_dispatches_total", "Collections handed to the sink"), &["collection", "operation"]).unwrap(),
            sink_records: IntCounterVec::new(Opts::new("sink_records_total", "Records handed to the sink"), &["collection"]).unwrap(),
            sink_failures: IntCounterVec::new(Opts::new("sink_failures_total", "Sink write failures"), &["collection"]).unwrap(),

            // Traversal
            branch_failures: IntCounterVec::new(Opts::new("branch_failures_total", "Isolated branch failures"), &["branch"]).unwrap(),
            import_runs: IntCounterVec::new(Opts::new("import_runs_total", "Import runs by mode and outcome"), &["mode", "outcome"]).unwrap(),

            // Config
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that failed to parse").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refreshes.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_skipped_links.clone())).unwrap();
        reg.register(Box::new(metrics.sink_dispatches.clone())).unwrap();
        reg.register(Box::new(metrics.sink_records.clone())).unwrap();
        reg.register(Box::new(metrics.sink_failures.clone())).unwrap();
        reg.register(Box::new(metrics.branch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.import_runs.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();

        metrics
    }
}
