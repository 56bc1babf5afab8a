// * Rival-Radar: competitor intelligence
// * Scrape competitor pages, extract pricing/product signals, compute market metrics.

pub mod config;
pub mod engine;
pub mod metrics;
pub mod network;
pub mod ops;
pub mod persistence;
pub mod refinery;
