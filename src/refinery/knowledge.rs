// * Vendor Knowledge Layer
// * Key-value override table consulted before generic pattern extraction.
// * Swappable through the `KnowledgeSource` trait.

use serde::{Deserialize, Serialize};

/// Curated facts about a known vendor. Every field is a display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub pricing: Option<String>,
    pub ai_capabilities: Option<String>,
    pub target_market: Option<String>,
}

/// A competitor suggestion: display name plus homepage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorLead {
    pub company: String,
    pub url: String,
}

impl CompetitorLead {
    pub fn new(company: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            url: url.into(),
        }
    }
}

/// Strategy over where vendor facts come from
pub trait KnowledgeSource: Send + Sync {
    /// Returns the profile for a company, if known
    fn lookup(&self, company: &str) -> Option<&VendorProfile>;

    /// Returns known competitors for a company
    fn competitors_of(&self, company: &str) -> Vec<CompetitorLead>;
}

/// Knowledge source that knows nothing; extraction falls through to patterns
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyKnowledge;

impl KnowledgeSource for EmptyKnowledge {
    fn lookup(&self, _company: &str) -> Option<&VendorProfile> {
        None
    }

    fn competitors_of(&self, _company: &str) -> Vec<CompetitorLead> {
        Vec::new()
    }
}

/// In-memory vendor table keyed by lowercase company name
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledge {
    vendors: Vec<(String, VendorProfile)>,
    competitors: Vec<(String, Vec<CompetitorLead>)>,
    fallback_competitors: Vec<CompetitorLead>,
}

impl StaticKnowledge {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the table shipped with the crate
    pub fn builtin() -> Self {
        let mut kb = Self::new();

        for (key, pricing, ai, market) in BUILTIN_VENDORS {
            kb = kb.with_vendor(
                key,
                VendorProfile {
                    pricing: Some(pricing.to_string()),
                    ai_capabilities: Some(ai.to_string()),
                    target_market: Some(market.to_string()),
                },
            );
        }

        for (key, leads) in BUILTIN_COMPETITORS {
            let leads = leads.iter().map(|(name, url)| CompetitorLead::new(*name, *url)).collect();
            kb = kb.with_competitors(key, leads);
        }

        kb.fallback_competitors = DEFAULT_COMPETITORS
            .iter()
            .map(|(name, url)| CompetitorLead::new(*name, *url))
            .collect();
        kb
    }

    /// Adds or replaces a vendor profile
    pub fn with_vendor(mut self, key: &str, profile: VendorProfile) -> Self {
        let key = key.trim().to_lowercase();
        self.vendors.retain(|(k, _)| *k != key);
        self.vendors.push((key, profile));
        self
    }

    /// Adds or replaces the competitor list for a company key
    pub fn with_competitors(mut self, key: &str, leads: Vec<CompetitorLead>) -> Self {
        let key = key.trim().to_lowercase();
        self.competitors.retain(|(k, _)| *k != key);
        self.competitors.push((key, leads));
        self
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }
}

// * Exact match first, then substring either way. Empty names never match.
fn find_entry<'a, T>(entries: &'a [(String, T)], company: &str) -> Option<&'a T> {
    let name = company.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    entries
        .iter()
        .find(|(key, _)| *key == name)
        .or_else(|| {
            entries
                .iter()
                .find(|(key, _)| name.contains(key.as_str()) || key.contains(name.as_str()))
        })
        .map(|(_, value)| value)
}

impl KnowledgeSource for StaticKnowledge {
    fn lookup(&self, company: &str) -> Option<&VendorProfile> {
        find_entry(&self.vendors, company)
    }

    fn competitors_of(&self, company: &str) -> Vec<CompetitorLead> {
        find_entry(&self.competitors, company)
            .cloned()
            .unwrap_or_else(|| self.fallback_competitors.clone())
    }
}

// * (key, pricing, ai capabilities, target market)
const BUILTIN_VENDORS: &[(&str, &str, &str, &str)] = &[
    ("salesforce", "$25/user/month", "Einstein AI, Predictive Analytics, Generative AI", "Enterprise, Mid-Market"),
    ("hubspot", "$20/month", "AI Content Assistant, Chatbots, Predictive Lead Scoring", "Small Business, Mid-Market"),
    ("pipedrive", "$14/user/month", "AI Sales Assistant, Automation", "Small Business"),
    ("zoho crm", "$14/user/month", "Zia AI Assistant, Predictive Analytics", "Small Business, Mid-Market"),
    ("slack", "$7.25/user/month", "Slack AI, Conversation Summaries, Search Answers", "Enterprise, Small Business"),
    ("zoom", "$14.99/month", "AI Companion, Meeting Summaries, Transcription", "Enterprise, Small Business, Consumers"),
    ("microsoft teams", "$4/user/month", "Copilot, Meeting Recap, Transcription", "Enterprise"),
    ("shopify", "$29/month", "Shopify Magic, Product Descriptions, Sidekick", "Small Business, E-commerce Merchants"),
    ("stripe", "2.9% + $0.30 per transaction", "Radar Fraud Detection, Machine Learning", "Developers, Enterprise, Startups"),
    ("mailchimp", "$13/month", "Content Optimizer, Predictive Segmentation", "Small Business"),
];

const BUILTIN_COMPETITORS: &[(&str, &[(&str, &str)])] = &[
    ("salesforce", &[
        ("HubSpot", "https://hubspot.com"),
        ("Pipedrive", "https://pipedrive.com"),
        ("Zoho CRM", "https://zoho.com/crm"),
        ("Microsoft Dynamics", "https://dynamics.microsoft.com"),
    ]),
    ("hubspot", &[
        ("Salesforce", "https://salesforce.com"),
        ("Marketo", "https://marketo.com"),
        ("Pardot", "https://pardot.com"),
        ("Mailchimp", "https://mailchimp.com"),
    ]),
    ("slack", &[
        ("Microsoft Teams", "https://teams.microsoft.com"),
        ("Discord", "https://discord.com"),
        ("Zoom", "https://zoom.us"),
        ("Google Meet", "https://meet.google.com"),
    ]),
    ("zoom", &[
        ("Microsoft Teams", "https://teams.microsoft.com"),
        ("Google Meet", "https://meet.google.com"),
        ("Webex", "https://webex.com"),
        ("GoToMeeting", "https://gotomeeting.com"),
    ]),
    ("shopify", &[
        ("WooCommerce", "https://woocommerce.com"),
        ("Magento", "https://magento.com"),
        ("BigCommerce", "https://bigcommerce.com"),
        ("Squarespace", "https://squarespace.com"),
    ]),
    ("stripe", &[
        ("PayPal", "https://paypal.com"),
        ("Square", "https://square.com"),
        ("Adyen", "https://adyen.com"),
        ("Braintree", "https://braintreepayments.com"),
    ]),
];

const DEFAULT_COMPETITORS: &[(&str, &str)] = &[
    ("Microsoft", "https://microsoft.com"),
    ("Google", "https://google.com"),
    ("Amazon", "https://amazon.com"),
    ("Apple", "https://apple.com"),
];
