// * The Engine
// * Text normalization, scrape pacing and the scrape dispatcher

pub mod dispatcher;
pub mod normalization;
pub mod pacing;

// * Re-exports for convenient access
pub use dispatcher::{DispatchError, RefreshReport, ScrapeDispatcher, ScrapedCompetitor};
pub use normalization::{is_valid_url, normalize_text, normalize_url, truncate_content};
pub use pacing::ScrapePacer;
