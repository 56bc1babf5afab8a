// * The Metrics Engine
// * Pure functions over an in-memory record collection. Insufficient data yields
// * an explicit empty result (None, empty Vec), never an error.

pub mod insights;
pub mod market;
pub mod outliers;
pub mod stats;
pub mod trends;

// * Re-exports for convenient access
pub use insights::{
    comparison_table, competitive_insights, format_currency, market_gaps, price_anomalies,
    pricing_insights, pricing_recommendations, ComparisonRow, CompetitiveInsights,
    PricingInsights, PricingRecommendation,
};
pub use market::{
    activity_trend, category_distribution, company_counts, daily_unique_companies, linear_trend,
    market_concentration, price_dispersion, price_trend, ConcentrationLevel, DispersionLevel,
    MarketConcentration, PriceDispersion, Trend, TrendDirection,
};
pub use outliers::{detect_outliers, OutlierMethod, RecordField};
pub use stats::{quantile, PriceStats};
pub use trends::{
    identify_trends, market_growth, market_predictions, percent_change, pricing_trend,
    trend_correlations, MarketPrediction, PricingTrend, TrendInsight, TrendReport,
};

use crate::config::constants::DEFAULT_RECENT_DAYS;
use crate::persistence::schema::CompetitorRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Inputs that are not part of the record collection
#[derive(Debug, Clone, Copy)]
pub struct MetricsOptions {
    /// Reference time for the recent-activity window
    pub now: DateTime<Utc>,
    pub recent_days: i64,
}

impl MetricsOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            recent_days: DEFAULT_RECENT_DAYS,
        }
    }

    pub fn with_recent_days(mut self, days: i64) -> Self {
        self.recent_days = days;
        self
    }

    pub fn recent_cutoff(&self) -> DateTime<Utc> {
        window_start(self.now, self.recent_days)
    }
}

/// Start of a window reaching `days` back from `now`, clamped to the representable range
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(if days < 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        })
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// Derived summary of a record collection; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_records: usize,
    pub unique_companies: usize,
    pub category_count: usize,
    pub category_distribution: Vec<(String, usize)>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub recent_activity: usize,
    pub price_stats: Option<PriceStats>,
    pub concentration: Option<MarketConcentration>,
    pub dispersion: Option<PriceDispersion>,
    pub activity_trend: Option<Trend>,
}

impl MetricsSummary {
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    /// Converts to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Converts to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Computes the full summary. Deterministic for identical records and options.
pub fn compute_metrics(records: &[CompetitorRecord], options: &MetricsOptions) -> MetricsSummary {
    let unique_companies = records
        .iter()
        .map(|r| r.company.as_str())
        .collect::<HashSet<_>>()
        .len();
    let category_distribution = category_distribution(records);

    let first = records.iter().map(|r| r.last_updated).min();
    let last = records.iter().map(|r| r.last_updated).max();
    let date_range = first.zip(last);

    let cutoff = options.recent_cutoff();
    let recent_activity = records.iter().filter(|r| r.last_updated >= cutoff).count();

    let summary = MetricsSummary {
        total_records: records.len(),
        unique_companies,
        category_count: category_distribution.len(),
        category_distribution,
        date_range,
        recent_activity,
        price_stats: PriceStats::from_values(&market::prices(records)),
        concentration: market_concentration(records),
        dispersion: price_dispersion(records),
        activity_trend: activity_trend(records),
    };

    tracing::debug!(
        records = summary.total_records,
        companies = summary.unique_companies,
        categories = summary.category_count,
        recent = summary.recent_activity,
        "Metrics computed"
    );

    summary
}
