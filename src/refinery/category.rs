// * Category Inference
// * Keyword scoring over company name + content. Ties resolve to the earlier table entry.

use crate::config::constants::DEFAULT_CATEGORY;

/// Ordered keyword table mapping category -> keywords
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<(String, Vec<String>)>,
}

impl CategoryClassifier {
    /// Builds a classifier from an ordered rule table
    pub fn new<C, K>(rules: impl IntoIterator<Item = (C, Vec<K>)>) -> Self
    where
        C: Into<String>,
        K: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(category, keywords)| {
                    let keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
                    (category.into(), keywords)
                })
                .collect(),
        }
    }

    /// Number of distinct keywords of each category present in the combined text,
    /// in table order. Categories without hits are omitted.
    pub fn scores(&self, company: &str, content: &str) -> Vec<(&str, usize)> {
        let combined = format!("{} {}", company.to_lowercase(), content.to_lowercase());

        self.rules
            .iter()
            .map(|(category, keywords)| {
                let hits = keywords.iter().filter(|k| combined.contains(k.as_str())).count();
                (category.as_str(), hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .collect()
    }

    /// Returns the best scoring category, or "Other" when nothing matches
    pub fn classify(&self, company: &str, content: &str) -> String {
        let mut best: Option<(&str, usize)> = None;
        for (category, hits) in self.scores(company, content) {
            // * Strictly greater keeps the first category on ties
            if best.map_or(true, |(_, top)| hits > top) {
                best = Some((category, hits));
            }
        }

        best.map(|(category, _)| category.to_string())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(c, _)| c.as_str())
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(vec![
            ("SaaS", vec!["saas", "software", "platform", "cloud", "app", "service"]),
            ("E-commerce", vec!["shop", "store", "retail", "marketplace", "commerce", "buy", "sell"]),
            ("Fintech", vec!["finance", "banking", "payment", "fintech", "money", "investment"]),
            ("Healthcare", vec!["health", "medical", "care", "hospital", "clinic", "pharma"]),
            ("Education", vec!["education", "learning", "school", "university", "course", "training"]),
            ("Marketing", vec!["marketing", "advertising", "campaign", "promotion", "brand"]),
            ("Analytics", vec!["analytics", "data", "insights", "intelligence", "reporting"]),
            ("Communication", vec!["communication", "messaging", "chat", "video", "conference"]),
            ("Productivity", vec!["productivity", "workflow", "management", "organization"]),
            ("Security", vec!["security", "protection", "cyber", "antivirus", "firewall"]),
        ])
    }
}

/// Classifies with the default keyword table
pub fn categorize(company: &str, content: &str) -> String {
    CategoryClassifier::default().classify(company, content)
}
