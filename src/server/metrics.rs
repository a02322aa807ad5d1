use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all Tessera metrics
const PREFIX: &str = "tessera";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Notification Metrics
    pub static ref NOTIFICATIONS_CREATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_notifications_created_total"), "Notifications stored, by kind"),
        &["kind"]
    ).expect("Failed to create notifications_created_total metric");

    pub static ref NOTIFICATION_DEDUP_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_notification_dedup_hits_total"),
            "Notifications collapsed into an existing row, by kind"
        ),
        &["kind"]
    ).expect("Failed to create notification_dedup_hits_total metric");

    pub static ref NOTIFICATION_STORE_FAILURES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_notification_store_failures_total"),
        "Notifications lost to storage errors"
    ).expect("Failed to create notification_store_failures_total metric");

    // Push Delivery Metrics
    pub static ref PUSH_DELIVERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_push_deliveries_total"),
            "Push delivery attempts by result"
        ),
        &["result"]
    ).expect("Failed to create push_deliveries_total metric");

    pub static ref PUSH_TOKENS_PRUNED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_push_tokens_pruned_total"),
            "Dead device tokens removed, by what exposed them"
        ),
        &["trigger"]
    ).expect("Failed to create push_tokens_pruned_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATIONS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATION_DEDUP_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATION_STORE_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PUSH_DELIVERIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PUSH_TOKENS_PRUNED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a stored notification
pub fn record_notification_created(kind: &str) {
    NOTIFICATIONS_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a notification collapsed into an existing one
pub fn record_dedup_hit(kind: &str) {
    NOTIFICATION_DEDUP_HITS_TOTAL
        .with_label_values(&[kind])
        .inc();
}

/// Record a notification lost to a storage error
pub fn record_store_failure() {
    NOTIFICATION_STORE_FAILURES_TOTAL.inc();
}

/// Record the result of one push delivery attempt
pub fn record_push_delivery(result: &str) {
    PUSH_DELIVERIES_TOTAL.with_label_values(&[result]).inc();
}

/// Record removed device tokens, trigger is "probe" or "delivery"
pub fn record_tokens_pruned(trigger: &str, count: usize) {
    PUSH_TOKENS_PRUNED_TOTAL
        .with_label_values(&[trigger])
        .inc_by(count as f64);
}

/// Update process memory usage
pub fn update_memory_usage() {
    // Get current process memory usage
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // Parse the RSS (Resident Set Size) in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            // Convert kB to bytes
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }

    // Fallback for non-Linux systems or if reading fails
    // We'll just not update the metric
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    // Update memory usage before returning metrics
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
