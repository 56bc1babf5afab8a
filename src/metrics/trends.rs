// * Trend analytics over time: price movement, market growth, price/activity
// * correlation and short-term predictions. Pure; `now` is passed in.

use super::market::{daily_mean_price, daily_unique_companies, TrendDirection};
use super::window_start;
use crate::config::constants::{
    CORRELATION_THRESHOLD, MIN_CORRELATION_DAYS, PREDICTION_MAX_CONFIDENCE,
    PREDICTION_MIN_CHANGE_PCT, PREDICTION_PRICE_WINDOW, TREND_RECENT_DAYS,
};
use crate::persistence::schema::CompetitorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Change in daily mean price between the first and last observed day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTrend {
    pub direction: TrendDirection,
    pub change: f64,
    pub description: String,
}

/// Trend groups; the model pass may add feature trends and strategic insights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendReport {
    pub pricing_trends: Vec<PricingTrend>,
    pub feature_trends: Vec<String>,
    pub market_trends: Vec<String>,
    pub strategic_insights: Vec<String>,
}

/// Trend commentary returned by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendInsight {
    pub feature_trends: Vec<String>,
    pub market_trends: Vec<String>,
    pub strategic_insights: Vec<String>,
}

impl TrendReport {
    pub fn is_empty(&self) -> bool {
        self.pricing_trends.is_empty()
            && self.feature_trends.is_empty()
            && self.market_trends.is_empty()
            && self.strategic_insights.is_empty()
    }

    /// Appends model commentary to the computed trends
    pub fn merge(&mut self, other: TrendInsight) {
        self.feature_trends.extend(other.feature_trends);
        self.market_trends.extend(other.market_trends);
        self.strategic_insights.extend(other.strategic_insights);
    }
}

/// Daily mean price movement from the first to the last priced day. Needs two priced days.
pub fn pricing_trend(records: &[CompetitorRecord]) -> Option<PricingTrend> {
    let days = daily_mean_price(records);
    if days.len() < 2 {
        return None;
    }

    let (_, first) = days.first()?;
    let (_, last) = days.last()?;
    let delta = last - first;

    let (direction, description) = if delta > 0.0 {
        (
            TrendDirection::Increasing,
            format!("Average price has increased by ${:.2}", delta.abs()),
        )
    } else if delta < 0.0 {
        (
            TrendDirection::Decreasing,
            format!("Average price has decreased by ${:.2}", delta.abs()),
        )
    } else {
        (TrendDirection::Stable, "Average price is unchanged".to_string())
    };

    Some(PricingTrend {
        direction,
        change: delta.abs(),
        description,
    })
}

/// Growth in distinct companies per day, first day against last day
pub fn market_growth(records: &[CompetitorRecord]) -> Option<String> {
    let days = daily_unique_companies(records);
    if days.len() < 2 {
        return None;
    }

    let (_, first) = days.first()?;
    let (_, last) = days.last()?;
    (last > first).then(|| format!("{} new competitors identified recently", last - first))
}

/// Computed trends; model commentary is merged in by the caller
pub fn identify_trends(records: &[CompetitorRecord]) -> TrendReport {
    TrendReport {
        pricing_trends: pricing_trend(records).into_iter().collect(),
        market_trends: market_growth(records).into_iter().collect(),
        ..TrendReport::default()
    }
}

/// Pearson correlation; `None` for fewer than two points or zero variance
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Strong correlation between daily mean price and daily distinct companies.
/// Only days with a price count; needs more than three of them.
pub fn trend_correlations(records: &[CompetitorRecord]) -> Vec<String> {
    let companies: HashMap<_, _> = daily_unique_companies(records).into_iter().collect();
    let (prices, counts): (Vec<f64>, Vec<f64>) = daily_mean_price(records)
        .into_iter()
        .filter_map(|(day, mean)| companies.get(&day).map(|c| (mean, *c as f64)))
        .unzip();

    if prices.len() < MIN_CORRELATION_DAYS {
        return Vec::new();
    }

    match pearson(&prices, &counts) {
        Some(r) if r.abs() > CORRELATION_THRESHOLD => {
            let direction = if r > 0.0 { "positive" } else { "negative" };
            vec![format!(
                "Strong {} correlation ({:.2}) between pricing and market activity",
                direction, r
            )]
        }
        _ => Vec::new(),
    }
}

/// Percent change from the first value to the last. A zero start counts as 1.
pub fn percent_change(values: &[f64]) -> f64 {
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if values.len() < 2 {
        return 0.0;
    }

    let start = if *first == 0.0 { 1.0 } else { *first };
    (last - start) / start * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrediction {
    pub timeframe: String,
    pub prediction: String,
    pub confidence: f64,
}

impl MarketPrediction {
    fn new(timeframe: &str, prediction: String, confidence: f64) -> Self {
        Self {
            timeframe: timeframe.to_string(),
            prediction,
            confidence,
        }
    }
}

/// Short-term price and market-entry predictions, or a stable-market default
///
/// Prices are taken in `last_updated` order; the last five drive the price call.
pub fn market_predictions(records: &[CompetitorRecord], now: DateTime<Utc>) -> Vec<MarketPrediction> {
    let mut predictions = Vec::new();

    let mut priced: Vec<&CompetitorRecord> = records
        .iter()
        .filter(|r| r.price.is_some_and(f64::is_finite))
        .collect();
    priced.sort_by_key(|r| r.last_updated);

    if priced.len() > PREDICTION_PRICE_WINDOW {
        let recent: Vec<f64> = priced[priced.len() - PREDICTION_PRICE_WINDOW..]
            .iter()
            .filter_map(|r| r.price)
            .collect();
        let change = percent_change(&recent);

        if change.abs() > PREDICTION_MIN_CHANGE_PCT {
            let direction = if change > 0.0 { "increase" } else { "decrease" };
            predictions.push(MarketPrediction::new(
                "Short-term (Next 30 days)",
                format!(
                    "Prices likely to {} by {:.1}% based on recent trends",
                    direction,
                    change.abs()
                ),
                PREDICTION_MAX_CONFIDENCE.min(50.0 + change.abs()),
            ));
        }
    }

    let companies: HashSet<&str> = records.iter().map(|r| r.company.as_str()).collect();
    if companies.len() > 2 {
        let cutoff = window_start(now, TREND_RECENT_DAYS);
        let recent_entrants = records
            .iter()
            .filter(|r| r.last_updated >= cutoff)
            .map(|r| r.company.as_str())
            .collect::<HashSet<_>>()
            .len();

        if recent_entrants > 0 {
            predictions.push(MarketPrediction::new(
                "Medium-term (Next 3 months)",
                format!(
                    "Market attractiveness suggests {} new competitors may enter",
                    recent_entrants + 1
                ),
                60.0,
            ));
        }
    }

    if predictions.is_empty() {
        predictions.push(MarketPrediction::new(
            "General Market",
            "Market appears stable with no significant disruption indicators".to_string(),
            70.0,
        ));
    }

    predictions
}
