use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Issuance metrics
    pub issuance_requests: IntCounter,
    pub issuance_failures: IntCounterVec,
    pub issuance_duration: Histogram,

    // Pool metrics
    pub batches: IntCounter,
    pub pooled_tokens: IntGauge,

    // Store metrics
    pub store_writes: IntCounter,
    pub store_failures: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenpool".into()), None).expect("valid registry prefix");

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Issuance
            issuance_requests: IntCounter::new("issuance_requests_total", "Total token issuance attempts").expect("valid metric"),
            issuance_failures: IntCounterVec::new(Opts::new("issuance_failures_total", "Issuance failures by vendor code"), &["code"]).expect("valid metric"),
            issuance_duration: Histogram::with_opts(HistogramOpts::new("issuance_duration_seconds", "Issuance round-trip seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])).expect("valid metric"),

            // Pool
            batches: IntCounter::new("batches_total", "Completed issuance batches").expect("valid metric"),
            pooled_tokens: IntGauge::new("pooled_tokens", "Tokens in the store after the last persist").expect("valid metric"),

            // Store
            store_writes: IntCounter::new("store_writes_total", "Successful store rewrites").expect("valid metric"),
            store_failures: IntCounterVec::new(Opts::new("store_failures_total", "Store failures by kind"), &["kind"]).expect("valid metric"),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").expect("valid metric"),
            up: IntGauge::new("up", "1 if service is healthy").expect("valid metric"),
            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").expect("valid metric"),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").expect("valid metric"),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").expect("valid metric"),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").expect("valid metric"),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").expect("valid metric"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(metrics.issuance_requests.clone()),
            Box::new(metrics.issuance_failures.clone()),
            Box::new(metrics.issuance_duration.clone()),
            Box::new(metrics.batches.clone()),
            Box::new(metrics.pooled_tokens.clone()),
            Box::new(metrics.store_writes.clone()),
            Box::new(metrics.store_failures.clone()),
            Box::new(metrics.config_validation_errors.clone()),
            Box::new(metrics.up.clone()),
            Box::new(metrics.process_cpu_usage.clone()),
            Box::new(metrics.process_memory_usage.clone()),
            Box::new(metrics.process_open_fds.clone()),
            Box::new(metrics.process_start_time.clone()),
            Box::new(metrics.process_uptime.clone()),
        ];
        for collector in collectors {
            reg.register(collector).expect("unique metric names");
        }

        metrics
    }
}
