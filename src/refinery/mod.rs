// * The Refinery (Extraction Pipeline)
// * Turns scraped page text plus a company name into structured competitor signals.
// * Every function here is pure: same input, same output, no I/O.

pub mod category;
pub mod content_cleaner;
pub mod knowledge;
pub mod metadata;
pub mod regex_extractor;
pub mod signals;

// * Re-exports for convenient access
pub use category::{categorize, CategoryClassifier};
pub use content_cleaner::{extract_text, CleanerConfig, ContentCleaner, PageText};
pub use knowledge::{CompetitorLead, EmptyKnowledge, KnowledgeSource, StaticKnowledge, VendorProfile};
pub use metadata::{extract_page_metadata, PageMetadata};
pub use regex_extractor::{extract_price, extract_products, find_price, PriceMatch, PricePattern};
pub use signals::{extract_ai_capabilities, extract_target_market};

use crate::config::constants::NOT_AVAILABLE;
use crate::engine::normalization::normalize_text;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Structured signals extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSignals {
    /// Numeric price, `None` when nothing valid was found
    pub price: Option<f64>,
    /// Display form of the price: curated vendor string, "$x.xx", or "N/A"
    pub pricing: String,
    /// Product / feature phrases, at most five
    pub features: Vec<String>,
    pub ai_capabilities: String,
    pub target_market: String,
    pub category: String,
}

impl ExtractedSignals {
    /// Converts to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Converts to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// True when no field produced anything beyond its sentinel
    pub fn is_miss(&self) -> bool {
        self.price.is_none() && self.features.is_empty()
    }
}

/// Extraction pipeline: knowledge lookup first, generic patterns as fallback
///
/// # Example
/// ```ignore
/// use rival_radar::refinery::Extractor;
///
/// let extractor = Extractor::new();
/// let signals = extractor.extract("Pro plan $49/month for small business", "Acme");
/// assert_eq!(signals.price, Some(49.0));
/// ```
#[derive(Clone)]
pub struct Extractor {
    knowledge: Arc<dyn KnowledgeSource>,
    classifier: CategoryClassifier,
}

impl Extractor {
    /// Creates an extractor with the built-in vendor table and category rules
    pub fn new() -> Self {
        Self::with_knowledge(Arc::new(StaticKnowledge::builtin()))
    }

    /// Creates an extractor over a custom knowledge source
    pub fn with_knowledge(knowledge: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            knowledge,
            classifier: CategoryClassifier::default(),
        }
    }

    /// Replaces the category rule table
    pub fn with_classifier(mut self, classifier: CategoryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn knowledge(&self) -> &Arc<dyn KnowledgeSource> {
        &self.knowledge
    }

    /// Extracts all signals from raw page text
    ///
    /// # Pipeline Steps:
    /// 1. Normalize text once
    /// 2. Price: curated pricing string if known, else ordered patterns
    /// 3. Features: product phrase patterns
    /// 4. AI capabilities / target market: curated value, else keywords
    /// 5. Category: keyword scoring over company + text
    pub fn extract(&self, text: &str, company: &str) -> ExtractedSignals {
        let normalized = normalize_text(text);
        let profile = self.knowledge.lookup(company);

        let (price, pricing) = match profile.and_then(|p| p.pricing.as_deref()) {
            Some(curated) => (extract_price(&normalize_text(curated)), curated.to_string()),
            None => {
                let price = extract_price(&normalized);
                let pricing = price
                    .map(|p| format!("${:.2}", p))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                (price, pricing)
            }
        };

        let ai_capabilities = profile
            .and_then(|p| p.ai_capabilities.clone())
            .unwrap_or_else(|| extract_ai_capabilities(&normalized));

        let target_market = profile
            .and_then(|p| p.target_market.clone())
            .unwrap_or_else(|| extract_target_market(&normalized));

        let signals = ExtractedSignals {
            price,
            pricing,
            features: extract_products(&normalized),
            ai_capabilities,
            target_market,
            category: self.classifier.classify(company, &normalized),
        };

        tracing::debug!(
            company = company,
            price = ?signals.price,
            features = signals.features.len(),
            category = %signals.category,
            curated = profile.is_some(),
            "Signals extracted"
        );

        signals
    }

    /// Infers a category only
    pub fn categorize(&self, company: &str, text: &str) -> String {
        self.classifier.classify(company, &normalize_text(text))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to extract with the built-in tables
pub fn extract(text: &str, company: &str) -> ExtractedSignals {
    Extractor::new().extract(text, company)
}
