// * Pricing & Product Pattern Extraction
// * Ordered regex heuristics over normalized page text. No I/O, no panics on bad input.

use crate::config::constants::{MAX_PRICE, MAX_PRODUCTS, MIN_PRICE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

// * Amount grammar shared by every price pattern: comma-grouped or plain digits, optional cents
macro_rules! amount {
    () => {
        r"(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)"
    };
}

static PATTERN_CURRENCY_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"(?i)\$", amount!())).expect("Invalid currency-prefixed regex")
});

static PATTERN_CURRENCY_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"(?i)", amount!(), r"\s*(?:usd|dollars?|bucks?)\b"))
        .expect("Invalid currency-suffixed regex")
});

static PATTERN_KEYWORD_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:price|cost|fee|rate|from|starting|only)\s*:?\s*\$?",
        amount!()
    ))
    .expect("Invalid keyword-prefixed regex")
});

static PATTERN_PER_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\$",
        amount!(),
        r"\s*(?:/|per)?\s*(?:month|mo|year|yr|annum|week|day|user)\b"
    ))
    .expect("Invalid per-period regex")
});

static PATTERN_PRICED_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(r"(?i)\b(?:priced\s+at|costs?|worth)\s+\$?", amount!()))
        .expect("Invalid priced-at regex")
});

// * Product / feature phrase patterns. Keywords are case-insensitive, captures must be capitalised.
static PATTERN_OFFERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:product|service|solution)s?\s*:?\s*([A-Z][a-zA-Z ]{2,30})")
        .expect("Invalid offering regex")
});

static PATTERN_LAUNCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:introducing|announcing|launch(?:ing)?)\s+([A-Z][a-zA-Z ]{2,30})")
        .expect("Invalid launch regex")
});

static PATTERN_PRODUCT_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-zA-Z]{2,20})\s+(?i:platform|software|app|tool|service)\b")
        .expect("Invalid product-noun regex")
});

/// Which price pattern produced a match, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricePattern {
    CurrencyPrefixed,
    CurrencySuffixed,
    KeywordPrefixed,
    PerPeriod,
    PricedAt,
}

impl PricePattern {
    /// Patterns in the order they are tried
    pub const PRIORITY: [PricePattern; 5] = [
        PricePattern::CurrencyPrefixed,
        PricePattern::CurrencySuffixed,
        PricePattern::KeywordPrefixed,
        PricePattern::PerPeriod,
        PricePattern::PricedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PricePattern::CurrencyPrefixed => "currency_prefixed",
            PricePattern::CurrencySuffixed => "currency_suffixed",
            PricePattern::KeywordPrefixed => "keyword_prefixed",
            PricePattern::PerPeriod => "per_period",
            PricePattern::PricedAt => "priced_at",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            PricePattern::CurrencyPrefixed => &PATTERN_CURRENCY_PREFIXED,
            PricePattern::CurrencySuffixed => &PATTERN_CURRENCY_SUFFIXED,
            PricePattern::KeywordPrefixed => &PATTERN_KEYWORD_PREFIXED,
            PricePattern::PerPeriod => &PATTERN_PER_PERIOD,
            PricePattern::PricedAt => &PATTERN_PRICED_AT,
        }
    }
}

/// A validated price and the pattern that found it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceMatch {
    pub value: f64,
    pub pattern: PricePattern,
}

/// Parses a comma-grouped amount and checks it against the accepted price range
pub fn parse_amount(raw: &str) -> Option<f64> {
    let value: f64 = raw.replace(',', "").parse().ok()?;
    is_valid_price(value).then_some(value)
}

/// True for finite values inside [MIN_PRICE, MAX_PRICE]
pub fn is_valid_price(value: f64) -> bool {
    value.is_finite() && (MIN_PRICE..=MAX_PRICE).contains(&value)
}

/// Finds the first valid price, trying patterns in priority order and
/// candidates within a pattern in text order.
pub fn find_price(text: &str) -> Option<PriceMatch> {
    if text.is_empty() {
        return None;
    }

    PricePattern::PRIORITY.iter().find_map(|pattern| {
        pattern
            .regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| parse_amount(m.as_str()))
            .map(|value| PriceMatch {
                value,
                pattern: *pattern,
            })
    })
}

/// Extracts a price from text; `None` is the miss sentinel
pub fn extract_price(text: &str) -> Option<f64> {
    find_price(text).map(|m| m.value)
}

/// Extracts up to five product/service phrases, first-seen order, no duplicates
pub fn extract_products(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for pattern in [&*PATTERN_OFFERING, &*PATTERN_LAUNCH, &*PATTERN_PRODUCT_NOUN] {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let phrase = m.as_str().trim();
            if phrase.len() > 2 && seen.insert(phrase.to_string()) {
                products.push(phrase.to_string());
            }
        }
    }

    products.truncate(MAX_PRODUCTS);
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_amount() {
        assert_eq!(extract_price("Pro plan $49.99 billed monthly"), Some(49.99));
    }

    #[test]
    fn test_comma_grouped_amount() {
        assert_eq!(extract_price("Enterprise tier $1,299.00 per year"), Some(1299.0));
    }

    #[test]
    fn test_plain_digits_are_not_split() {
        assert_eq!(extract_price("Only $1500 for the bundle"), Some(1500.0));
    }

    #[test]
    fn test_currency_suffix() {
        let m = find_price("Licenses cost about 250 USD each").unwrap();
        assert_eq!(m.value, 250.0);
        assert_eq!(m.pattern, PricePattern::CurrencySuffixed);
    }

    #[test]
    fn test_keyword_prefix() {
        let m = find_price("Price 120 for the starter kit").unwrap();
        assert_eq!(m.value, 120.0);
        assert_eq!(m.pattern, PricePattern::KeywordPrefixed);
    }

    #[test]
    fn test_priced_at() {
        let m = find_price("The suite is priced at 75").unwrap();
        assert_eq!(m.pattern, PricePattern::PricedAt);
        assert_eq!(m.value, 75.0);
    }

    #[test]
    fn test_pattern_priority_over_position() {
        // * Currency-prefixed wins even though the USD amount appears first
        let m = find_price("Was 300 USD, now $199").unwrap();
        assert_eq!(m.pattern, PricePattern::CurrencyPrefixed);
        assert_eq!(m.value, 199.0);
    }

    #[test]
    fn test_out_of_range_is_sentinel() {
        assert_eq!(extract_price("Valuation of $2,000,000"), None);
        assert_eq!(extract_price("Costs $0.001 per call"), None);
        assert_eq!(extract_price("$0"), None);
    }

    #[test]
    fn test_out_of_range_candidate_is_skipped() {
        assert_eq!(extract_price("From $0 setup, then $29 per month"), Some(29.0));
    }

    #[test]
    fn test_no_price() {
        assert_eq!(extract_price("Contact sales for a quote"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn test_products_from_launch_and_noun_patterns() {
        let text = "Introducing Nimbus Sync. Teams love the Orbit platform and Pulse app";
        let products = extract_products(text);
        assert_eq!(products, vec!["Nimbus Sync", "Orbit", "Pulse"]);
    }

    #[test]
    fn test_products_deduplicated_and_capped() {
        let text = "Alpha tool. Alpha tool. Bravo tool. Charlie tool. Delta tool. Echo tool. Foxtrot tool.";
        let products = extract_products(text);
        assert_eq!(products.len(), MAX_PRODUCTS);
        assert_eq!(products[0], "Alpha");
        assert_eq!(products[1], "Bravo");
    }

    #[test]
    fn test_lowercase_phrases_ignored() {
        assert!(extract_products("we build a great platform for everyone").is_empty());
    }
}
