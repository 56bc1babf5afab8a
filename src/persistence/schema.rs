// * Competitor Record Schema
// * One row per (company, product) observation. Serialized as a JSON array by the store.

use crate::config::constants::{CONTENT_CHAR_LIMIT, MAX_PRICE, NOT_AVAILABLE};
use crate::engine::normalization::{is_valid_url, truncate_content};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary record structure for the competitor store
///
/// # Fields
/// - `company`: Competitor name (required)
/// - `source_url`: Page the record was scraped from (required)
/// - `category`: Market category, inferred or caller-provided
/// - `price`: Extracted price, `None` when nothing valid was found
/// - `product_name`: Product phrase, or "<company> Service"
/// - `content`: Page text, at most 5000 characters
/// - `last_updated`: Scrape timestamp (UTC, RFC 3339 on disk)
/// - `summary`: Model-written summary, when one was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorRecord {
    // * Identity
    pub company: String,
    pub source_url: String,

    // * Extracted signals
    pub category: String,
    pub price: Option<f64>,
    pub product_name: String,

    // * Content
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,

    // * Lifecycle
    pub last_updated: DateTime<Utc>,
}

impl CompetitorRecord {
    /// Creates a record stamped with the current time
    pub fn new(company: impl Into<String>, source_url: impl Into<String>) -> Self {
        let company = company.into();
        Self {
            product_name: format!("{} Service", company),
            company,
            source_url: source_url.into(),
            category: crate::config::constants::DEFAULT_CATEGORY.to_string(),
            price: None,
            content: String::new(),
            title: None,
            description: None,
            summary: None,
            last_updated: Utc::now(),
        }
    }

    /// Creates a record builder for fluent construction
    pub fn builder(company: impl Into<String>, source_url: impl Into<String>) -> CompetitorRecordBuilder {
        CompetitorRecordBuilder::new(company, source_url)
    }

    /// Content length in characters
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Price rendered for display
    pub fn price_label(&self) -> String {
        self.price
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Reports every problem with the record; empty means valid
    pub fn validate(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        if self.company.trim().is_empty() {
            errors.push(SchemaError::MissingField("company"));
        }

        if self.source_url.trim().is_empty() {
            errors.push(SchemaError::MissingField("source_url"));
        } else if !is_valid_url(&self.source_url) {
            errors.push(SchemaError::InvalidUrl(self.source_url.clone()));
        }

        if let Some(price) = self.price {
            if !price.is_finite() {
                errors.push(SchemaError::InvalidPrice(price));
            } else if price < 0.0 {
                errors.push(SchemaError::NegativePrice(price));
            } else if price > MAX_PRICE {
                errors.push(SchemaError::PriceTooHigh(price));
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Converts to JSON string for serialization
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builder pattern for CompetitorRecord construction
#[derive(Debug, Clone)]
pub struct CompetitorRecordBuilder {
    record: CompetitorRecord,
}

impl CompetitorRecordBuilder {
    pub fn new(company: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            record: CompetitorRecord::new(company, source_url),
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.record.category = category.into();
        self
    }

    pub fn price(mut self, price: Option<f64>) -> Self {
        self.record.price = price;
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.record.product_name = name.into();
        self
    }

    /// Sets content, truncated to the storage limit
    pub fn content(mut self, content: &str) -> Self {
        self.record.content = truncate_content(content, CONTENT_CHAR_LIMIT);
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.record.title = title;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.record.description = description;
        self
    }

    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.record.summary = summary;
        self
    }

    pub fn last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.record.last_updated = at;
        self
    }

    pub fn build(self) -> CompetitorRecord {
        self.record
    }
}

/// Record validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Price cannot be negative: {0}")]
    NegativePrice(f64),

    #[error("Price seems unreasonably high: {0}")]
    PriceTooHigh(f64),

    #[error("Invalid price value: {0}")]
    InvalidPrice(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_creation() {
        let record = CompetitorRecord::new("Acme", "https://acme.io");

        assert_eq!(record.company, "Acme");
        assert_eq!(record.source_url, "https://acme.io");
        assert_eq!(record.product_name, "Acme Service");
        assert_eq!(record.category, "Other");
        assert!(record.price.is_none());
        assert!(record.summary.is_none());
        assert!(record.is_valid());
    }

    #[test]
    fn test_builder_pattern() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = CompetitorRecord::builder("Acme", "https://acme.io/pricing")
            .category("SaaS")
            .price(Some(49.0))
            .product_name("Acme Cloud")
            .content("Cloud hosting for teams")
            .summary(Some("Hosting vendor".into()))
            .last_updated(at)
            .build();

        assert_eq!(record.category, "SaaS");
        assert_eq!(record.price, Some(49.0));
        assert_eq!(record.product_name, "Acme Cloud");
        assert_eq!(record.last_updated, at);
        assert_eq!(record.price_label(), "$49.00");
    }

    #[test]
    fn test_content_truncated() {
        let long = "x".repeat(CONTENT_CHAR_LIMIT + 100);
        let record = CompetitorRecord::builder("Acme", "https://acme.io")
            .content(&long)
            .build();
        assert_eq!(record.content_len(), CONTENT_CHAR_LIMIT);
    }

    #[test]
    fn test_validation_errors() {
        let record = CompetitorRecord::builder("", "")
            .price(Some(-5.0))
            .build();
        let errors = record.validate();

        assert!(errors.contains(&SchemaError::MissingField("company")));
        assert!(errors.contains(&SchemaError::MissingField("source_url")));
        assert!(errors.contains(&SchemaError::NegativePrice(-5.0)));
    }

    #[test]
    fn test_validation_price_bounds() {
        let high = CompetitorRecord::builder("Acme", "https://acme.io")
            .price(Some(2_000_000.0))
            .build();
        assert_eq!(high.validate(), vec![SchemaError::PriceTooHigh(2_000_000.0)]);

        let nan = CompetitorRecord::builder("Acme", "https://acme.io")
            .price(Some(f64::NAN))
            .build();
        assert!(matches!(nan.validate()[0], SchemaError::InvalidPrice(_)));
    }

    #[test]
    fn test_validation_bad_url() {
        let record = CompetitorRecord::new("Acme", "not a url");
        assert!(matches!(record.validate()[0], SchemaError::InvalidUrl(_)));
    }

    #[test]
    fn test_json_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = CompetitorRecord::builder("Acme", "https://acme.io")
            .last_updated(at)
            .build();
        let json = record.to_json();
        assert!(json.contains("\"last_updated\":\"2024-03-01T12:00:00Z\""));

        let back: CompetitorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
