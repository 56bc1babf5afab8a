// * Presentation-facing insight text derived from the numeric metrics.
// * These produce sentences for reports; thresholds live in config::constants.

use super::market::{category_distribution, prices};
use super::stats::{mean, quantile, sample_std, sorted_finite, PriceStats};
use crate::config::constants::{
    CV_HIGH, MIN_ANOMALY_SAMPLE, NOT_AVAILABLE, PRICE_GAP_QUANTILE,
    UNDERSERVED_CATEGORY_QUANTILE, ZSCORE_THRESHOLD,
};
use crate::persistence::schema::CompetitorRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Formats an amount as "$1,234.56", "-$5.00" or "N/A"
pub fn format_currency(amount: Option<f64>) -> String {
    let Some(amount) = amount.filter(|a| a.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

/// Pricing gaps and thinly covered categories
///
/// The price gap reported is the widest step between consecutive sorted prices,
/// provided it exceeds the 80th-percentile step. Categories below the
/// 25th-percentile record count are listed, at most three.
pub fn market_gaps(records: &[CompetitorRecord]) -> Vec<String> {
    let mut gaps = Vec::new();

    let sorted = sorted_finite(&prices(records));
    if sorted.len() >= 2 {
        let steps: Vec<(f64, f64, f64)> = sorted
            .windows(2)
            .map(|w| (w[0], w[1], w[1] - w[0]))
            .collect();
        let step_sizes = sorted_finite(&steps.iter().map(|s| s.2).collect::<Vec<_>>());

        if let Some(threshold) = quantile(&step_sizes, PRICE_GAP_QUANTILE) {
            let widest = steps
                .iter()
                .filter(|s| s.2 > threshold)
                .max_by(|a, b| a.2.total_cmp(&b.2));
            if let Some((low, high, _)) = widest {
                gaps.push(format!(
                    "Pricing gap between {} and {}",
                    format_currency(Some(*low)),
                    format_currency(Some(*high))
                ));
            }
        }
    }

    let distribution = category_distribution(records);
    let counts = sorted_finite(&distribution.iter().map(|(_, c)| *c as f64).collect::<Vec<_>>());
    if let Some(threshold) = quantile(&counts, UNDERSERVED_CATEGORY_QUANTILE) {
        let underserved: Vec<&str> = distribution
            .iter()
            .filter(|(_, c)| (*c as f64) < threshold)
            .map(|(name, _)| name.as_str())
            .take(3)
            .collect();
        if !underserved.is_empty() {
            gaps.push(format!("Underserved categories: {}", underserved.join(", ")));
        }
    }

    gaps
}

/// Records priced more than 2.5 standard deviations from the mean
///
/// Needs at least five priced records.
pub fn price_anomalies(records: &[CompetitorRecord]) -> Vec<String> {
    let priced: Vec<(&CompetitorRecord, f64)> = records
        .iter()
        .filter_map(|r| r.price.filter(|p| p.is_finite()).map(|p| (r, p)))
        .collect();
    if priced.len() < MIN_ANOMALY_SAMPLE {
        return Vec::new();
    }

    let values: Vec<f64> = priced.iter().map(|(_, p)| *p).collect();
    let (Some(avg), Some(std)) = (mean(&values), sample_std(&values)) else {
        return Vec::new();
    };
    if std == 0.0 || avg == 0.0 {
        return Vec::new();
    }

    priced
        .iter()
        .filter(|(_, p)| ((p - avg) / std).abs() > ZSCORE_THRESHOLD)
        .map(|(r, p)| {
            format!(
                "{} pricing ${:.2} ({:+.1}% from average)",
                r.company,
                p,
                (p - avg) / avg * 100.0
            )
        })
        .collect()
}

/// Opportunity / threat statements about the price landscape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingInsights {
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

impl PricingInsights {
    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty() && self.threats.is_empty()
    }
}

// * Mean price per key, keyed in ascending order
fn mean_price_by<'a>(
    records: &'a [CompetitorRecord],
    key: impl Fn(&'a CompetitorRecord) -> &'a str,
) -> BTreeMap<&'a str, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let Some(price) = record.price.filter(|p| p.is_finite()) {
            let entry = sums.entry(key(record)).or_default();
            entry.0 += price;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

pub fn pricing_insights(records: &[CompetitorRecord]) -> PricingInsights {
    let mut insights = PricingInsights::default();
    let Some(stats) = PriceStats::from_values(&prices(records)) else {
        return insights;
    };

    let cv = stats.coefficient_of_variation().unwrap_or(0.0);
    if cv > CV_HIGH {
        insights.opportunities.push(
            "High price variance indicates market fragmentation; room for strategic positioning"
                .to_string(),
        );
    }

    if stats.median < stats.mean * 0.8 {
        insights.opportunities.push(
            "Price distribution skewed toward the low end; premium positioning is open".to_string(),
        );
    }

    if stats.range() > stats.mean * 2.0 {
        insights
            .threats
            .push("Extreme price competition exists in the market".to_string());
    }

    let by_category = mean_price_by(records, |r| r.category.as_str());
    if by_category.len() > 1 {
        let highest = by_category.iter().max_by(|a, b| a.1.total_cmp(b.1));
        let lowest = by_category.iter().min_by(|a, b| a.1.total_cmp(b.1));
        if let (Some((hi_name, hi)), Some((lo_name, lo))) = (highest, lowest) {
            if *hi > *lo * 2.0 {
                insights.opportunities.push(format!(
                    "Significant pricing gap between {} and {} categories",
                    hi_name, lo_name
                ));
            }
        }
    }

    let by_company = mean_price_by(records, |r| r.company.as_str());
    if by_company.len() > 2 {
        let means = sorted_finite(&by_company.values().copied().collect::<Vec<_>>());
        if let Some(cutoff) = quantile(&means, 0.75) {
            let leaders = means.iter().filter(|m| **m > cutoff).count();
            if (leaders as f64) < by_company.len() as f64 * 0.3 {
                insights.opportunities.push(
                    "Market dominated by few high-priced players; disruption opportunity exists"
                        .to_string(),
                );
            }
        }
    }

    insights
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecommendation {
    pub title: String,
    pub description: String,
    pub action: String,
}

impl PricingRecommendation {
    fn new(title: &str, description: String, action: &str) -> Self {
        Self {
            title: title.to_string(),
            description,
            action: action.to_string(),
        }
    }
}

/// Actionable pricing recommendations. Empty when no record is priced.
pub fn pricing_recommendations(records: &[CompetitorRecord]) -> Vec<PricingRecommendation> {
    let mut recommendations = Vec::new();
    let values = prices(records);
    let Some(stats) = PriceStats::from_values(&values) else {
        return recommendations;
    };

    if stats.mean > stats.median * 1.2 {
        recommendations.push(PricingRecommendation::new(
            "Consider Value-Based Positioning",
            "Average prices sit well above the median, so the market carries premium pricing potential."
                .to_string(),
            "Communicate unique value propositions to justify premium pricing.",
        ));
    }

    let sorted = sorted_finite(&values);
    if let (Some(low), Some(high)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) {
        recommendations.push(PricingRecommendation::new(
            "Competitive Price Range Analysis",
            format!(
                "Competitive sweet spot appears to be between {} and {}.",
                format_currency(Some(low)),
                format_currency(Some(high))
            ),
            "Position within or deliberately outside this range based on value proposition.",
        ));
    }

    let priced: Vec<CompetitorRecord> = records
        .iter()
        .filter(|r| r.price.is_some_and(f64::is_finite))
        .cloned()
        .collect();
    let distribution = category_distribution(&priced);
    let counts = sorted_finite(&distribution.iter().map(|(_, c)| *c as f64).collect::<Vec<_>>());
    if let Some(median) = quantile(&counts, 0.5) {
        let underserved: Vec<&str> = distribution
            .iter()
            .filter(|(_, c)| (*c as f64) < median)
            .map(|(name, _)| name.as_str())
            .take(3)
            .collect();
        if !underserved.is_empty() {
            recommendations.push(PricingRecommendation::new(
                "Market Gap Opportunity",
                format!("Categories like {} appear underserved.", underserved.join(", ")),
                "Expand into underserved categories with targeted pricing strategies.",
            ));
        }
    }

    recommendations.push(PricingRecommendation::new(
        "Implement Dynamic Pricing Monitoring",
        "Regular competitor price tracking exposes market volatility patterns.".to_string(),
        "Schedule recurring scrapes and review price changes for key competitors.",
    ));

    recommendations
}

/// SWOT-style baseline insights computed without a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitiveInsights {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

impl CompetitiveInsights {
    /// Appends another set of insights, e.g. model output
    pub fn merge(&mut self, other: CompetitiveInsights) {
        self.strengths.extend(other.strengths);
        self.weaknesses.extend(other.weaknesses);
        self.opportunities.extend(other.opportunities);
        self.threats.extend(other.threats);
    }
}

pub fn competitive_insights(records: &[CompetitorRecord]) -> CompetitiveInsights {
    let mut insights = CompetitiveInsights::default();
    if records.is_empty() {
        return insights;
    }

    let values = sorted_finite(&prices(records));
    if let Some(median) = quantile(&values, 0.5) {
        let premium = values.iter().filter(|p| **p > median * 1.5).count();
        let budget = values.iter().filter(|p| **p < median * 0.5).count();

        if premium > 0 {
            insights.opportunities.push(format!(
                "Premium market opportunity: {} competitors pricing above {}",
                premium,
                format_currency(Some(median * 1.5))
            ));
        }
        if budget > 0 {
            insights
                .threats
                .push(format!("Price pressure from {} low-cost competitors", budget));
        }
    }

    let distribution = category_distribution(records);
    if let Some((dominant, count)) = distribution.first() {
        if *count as f64 > records.len() as f64 * 0.4 {
            insights.threats.push(format!(
                "Market dominated by {} category ({} competitors)",
                dominant, count
            ));
        }
    }

    if distribution.len() > 1 {
        let skip = distribution.len().saturating_sub(3);
        insights.opportunities.extend(
            distribution
                .iter()
                .skip(skip)
                .map(|(category, _)| format!("Emerging opportunity in {}", category)),
        );
    }

    insights
}

/// One row of a side-by-side company comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub company: String,
    pub products: usize,
    pub categories: String,
    pub avg_price: String,
    pub price_range: String,
    pub last_updated: String,
}

/// Comparison rows for the requested companies, in request order.
/// Companies without records are skipped.
pub fn comparison_table<S: AsRef<str>>(
    records: &[CompetitorRecord],
    companies: &[S],
) -> Vec<ComparisonRow> {
    companies
        .iter()
        .filter_map(|company| {
            let company = company.as_ref();
            let rows: Vec<&CompetitorRecord> =
                records.iter().filter(|r| r.company == company).collect();
            let last = rows.iter().map(|r| r.last_updated).max()?;

            let mut categories: Vec<&str> = Vec::new();
            for row in &rows {
                if !categories.contains(&row.category.as_str()) {
                    categories.push(row.category.as_str());
                }
            }

            let values: Vec<f64> = rows.iter().filter_map(|r| r.price).collect();
            let stats = PriceStats::from_values(&values);

            Some(ComparisonRow {
                company: company.to_string(),
                products: rows.len(),
                categories: categories.join(", "),
                avg_price: stats
                    .as_ref()
                    .map(|s| format!("${:.2}", s.mean))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                price_range: stats
                    .as_ref()
                    .map(|s| format!("${:.2} - ${:.2}", s.min, s.max))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                last_updated: last.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}
