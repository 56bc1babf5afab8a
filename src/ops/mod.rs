// * Operations
// * Structured logging setup and Prometheus counters

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    get_metrics_string, init_from_config, init_tracing, init_tracing_pretty,
    init_tracing_with_level, record_extraction_miss, record_fetch_failure, record_fetch_success,
    record_records_stored, record_scrape_duration, record_summary_requested,
};
