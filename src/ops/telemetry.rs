// * Telemetry - Structured Logging and Prometheus Counters
// * JSON logs by default, pretty logs for development; counters rendered on demand (no server)

use crate::config::LogFormat;
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Page fetches by outcome
    pub static ref PAGES_FETCHED_TOTAL: CounterVec = register_counter_vec!(
        "rival_pages_fetched_total",
        "Total page fetches by outcome",
        &["status"]
    ).unwrap();

    // * Records written to the store
    pub static ref RECORDS_STORED_TOTAL: Counter = register_counter!(
        "rival_records_stored_total",
        "Total competitor records written to the store"
    ).unwrap();

    // * Pages where neither a price nor a product was found
    pub static ref EXTRACTION_MISSES_TOTAL: Counter = register_counter!(
        "rival_extraction_misses_total",
        "Pages that yielded no price and no product"
    ).unwrap();

    // * Summaries requested from the analyst
    pub static ref SUMMARIES_REQUESTED_TOTAL: Counter = register_counter!(
        "rival_summaries_requested_total",
        "Total summaries requested from the analyst"
    ).unwrap();

    // * End-to-end scrape duration (fetch + extract + summarize)
    pub static ref SCRAPE_DURATION_SECONDS: Histogram = register_histogram!(
        "rival_scrape_duration_seconds",
        "Scrape duration in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use rival_radar::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(company = "Acme", "Scraping competitor");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes JSON tracing with a custom default level. `RUST_LOG` wins when set.
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    init_tracing_pretty_with_level("debug");
}

pub fn init_tracing_pretty_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .init();
}

/// Initializes tracing from the configured level and format
pub fn init_from_config(level: &str, format: LogFormat) {
    match format {
        LogFormat::Json => init_tracing_with_level(level),
        LogFormat::Pretty => init_tracing_pretty_with_level(level),
    }
}

/// Returns the current metrics in the Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records a page that produced readable text
pub fn record_fetch_success() {
    PAGES_FETCHED_TOTAL.with_label_values(&["success"]).inc();
}

/// Records a failed fetch
pub fn record_fetch_failure() {
    PAGES_FETCHED_TOTAL.with_label_values(&["failure"]).inc();
}

pub fn record_records_stored(count: usize) {
    RECORDS_STORED_TOTAL.inc_by(count as f64);
}

pub fn record_extraction_miss() {
    EXTRACTION_MISSES_TOTAL.inc();
}

pub fn record_summary_requested() {
    SUMMARIES_REQUESTED_TOTAL.inc();
}

pub fn record_scrape_duration(seconds: f64) {
    SCRAPE_DURATION_SECONDS.observe(seconds);
}
