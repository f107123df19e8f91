use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ACTIVE_USERS: IntGauge = IntGauge::new(
        "stampede_active_users",
        "Number of currently running virtual users"
    )
    .expect("metric can be created");
    pub static ref REQUESTS_TOTAL: IntCounter = IntCounter::new(
        "stampede_requests_total",
        "Total number of requests issued across all virtual users"
    )
    .expect("metric can be created");
    /// Count of requests that ended in a network error or non-success status
    pub static ref REQUEST_FAILURES: IntCounter = IntCounter::new(
        "stampede_request_failures_total",
        "Total number of requests that failed (transport error or non-success status)"
    )
    .expect("metric can be created");
}

pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(ACTIVE_USERS.clone()));
    let _ = REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(REQUEST_FAILURES.clone()));
}

pub fn render_metrics() -> String {
    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| "# Error: Invalid UTF8".to_string())
}
