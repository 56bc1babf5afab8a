// * Keyword signals: AI capabilities and target market.
// * Fallbacks used when the knowledge source has no curated value.

use crate::config::constants::{
    DEFAULT_AI_CAPABILITIES, DEFAULT_TARGET_MARKET, MAX_AI_CAPABILITIES, MAX_TARGET_MARKETS,
};

type TermTable = &'static [(&'static str, &'static [&'static str])];

// * (label, lowercase keywords)
const AI_CAPABILITY_TERMS: TermTable = &[
    ("Generative AI", &["generative ai", "genai", "gpt", "large language model", "llm"]),
    ("Machine Learning", &["machine learning", "ml model", "deep learning"]),
    ("Natural Language Processing", &["natural language", "nlp"]),
    ("Chatbots", &["chatbot", "virtual assistant", "conversational ai", "ai assistant", "copilot"]),
    ("Predictive Analytics", &["predictive", "forecasting"]),
    ("Computer Vision", &["computer vision", "image recognition"]),
    ("Recommendations", &["recommendation engine", "personalized recommendations", "personalization"]),
    ("AI Automation", &["ai-powered", "ai powered", "artificial intelligence", "intelligent automation"]),
];

const TARGET_MARKET_TERMS: TermTable = &[
    ("Enterprise", &["enterprise", "large organizations", "fortune 500", "global companies"]),
    ("Mid-Market", &["mid-market", "mid-sized", "midsize", "growing companies"]),
    ("Small Business", &["small business", "smb", "small teams", "small and medium"]),
    ("Startups", &["startup", "founders", "early-stage"]),
    ("Developers", &["developer", "api-first", "engineering teams"]),
    ("Consumers", &["consumers", "individuals", "personal use", "families"]),
    ("Education", &["students", "teachers", "schools", "universities"]),
    ("Healthcare Providers", &["clinicians", "hospitals", "healthcare providers", "patients"]),
];

/// Labels whose keywords occur in the text, table order, capped
pub fn match_labels(text: &str, table: TermTable, cap: usize) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    table
        .iter()
        .filter(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
        .map(|(label, _)| *label)
        .take(cap)
        .collect()
}

fn join_or_default(labels: Vec<&str>, default: &str) -> String {
    if labels.is_empty() {
        default.to_string()
    } else {
        labels.join(", ")
    }
}

/// Comma-joined AI capability labels (at most four) or the default sentinel
pub fn extract_ai_capabilities(text: &str) -> String {
    join_or_default(
        match_labels(text, AI_CAPABILITY_TERMS, MAX_AI_CAPABILITIES),
        DEFAULT_AI_CAPABILITIES,
    )
}

/// Comma-joined target market labels (at most three) or the default sentinel
pub fn extract_target_market(text: &str) -> String {
    join_or_default(
        match_labels(text, TARGET_MARKET_TERMS, MAX_TARGET_MARKETS),
        DEFAULT_TARGET_MARKET,
    )
}
