// * Persistence & Analysis Collaborators
// * Record schema, the JSON record store, and the language-model analyst

pub mod analyst;
pub mod schema;
pub mod store;

// * Re-exports for convenient access
pub use analyst::{
    AnalystError, AnalystFuture, DisabledAnalyst, InsightProvider, MarketInsight,
    OpenAiAnalyst, Summarizer,
};
pub use schema::{CompetitorRecord, CompetitorRecordBuilder, SchemaError};
pub use store::{ExportFormat, RecordStore, StoreError};
