// * Network Layer
// * Single-GET page fetching behind the PageFetcher trait

pub mod client;
pub mod errors;

// * Re-exports for convenient access
pub use client::{default_fetcher, FetchFuture, FetchedPage, HttpFetcher, PageFetcher};
pub use errors::FetchError;
