// * Market structure: concentration (HHI), price dispersion (CV) and linear trends.

use super::stats::PriceStats;
use crate::config::constants::{
    CV_HIGH, CV_MODERATE, HHI_HIGHLY_CONCENTRATED, HHI_MODERATELY_CONCENTRATED,
    TREND_SLOPE_THRESHOLD,
};
use crate::persistence::schema::CompetitorRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationLevel {
    #[serde(rename = "Highly Concentrated")]
    HighlyConcentrated,
    #[serde(rename = "Moderately Concentrated")]
    ModeratelyConcentrated,
    #[serde(rename = "Competitive")]
    Competitive,
}

impl ConcentrationLevel {
    pub fn from_hhi(hhi: f64) -> Self {
        if hhi > HHI_HIGHLY_CONCENTRATED {
            Self::HighlyConcentrated
        } else if hhi > HHI_MODERATELY_CONCENTRATED {
            Self::ModeratelyConcentrated
        } else {
            Self::Competitive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighlyConcentrated => "Highly Concentrated",
            Self::ModeratelyConcentrated => "Moderately Concentrated",
            Self::Competitive => "Competitive",
        }
    }
}

impl fmt::Display for ConcentrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Herfindahl-Hirschman Index over per-company record shares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConcentration {
    pub hhi: f64,
    pub level: ConcentrationLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispersionLevel {
    #[serde(rename = "High Dispersion")]
    High,
    #[serde(rename = "Moderate Dispersion")]
    Moderate,
    #[serde(rename = "Low Dispersion")]
    Low,
}

impl DispersionLevel {
    pub fn from_cv(cv: f64) -> Self {
        if cv > CV_HIGH {
            Self::High
        } else if cv > CV_MODERATE {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High Dispersion",
            Self::Moderate => "Moderate Dispersion",
            Self::Low => "Low Dispersion",
        }
    }
}

impl fmt::Display for DispersionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDispersion {
    pub coefficient_of_variation: f64,
    pub level: DispersionLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_SLOPE_THRESHOLD {
            Self::Increasing
        } else if slope < -TREND_SLOPE_THRESHOLD {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "Increasing",
            Self::Decreasing => "Decreasing",
            Self::Stable => "Stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub direction: TrendDirection,
}

/// Finite prices of all priced records, input order
pub fn prices(records: &[CompetitorRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.price)
        .filter(|p| p.is_finite())
        .collect()
}

// * Counts ordered by count desc, then key asc
fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Records per company, most frequent first
pub fn company_counts(records: &[CompetitorRecord]) -> Vec<(String, usize)> {
    ranked_counts(records.iter().map(|r| r.company.as_str()))
}

/// Records per category, most frequent first
pub fn category_distribution(records: &[CompetitorRecord]) -> Vec<(String, usize)> {
    ranked_counts(records.iter().map(|r| r.category.as_str()))
}

/// HHI = sum of squared company shares scaled to 10000. Empty input yields `None`.
pub fn market_concentration(records: &[CompetitorRecord]) -> Option<MarketConcentration> {
    if records.is_empty() {
        return None;
    }

    let total = records.len() as f64;
    let hhi: f64 = company_counts(records)
        .iter()
        .map(|(_, count)| (*count as f64 / total).powi(2))
        .sum::<f64>()
        * 10_000.0;

    Some(MarketConcentration {
        hhi,
        level: ConcentrationLevel::from_hhi(hhi),
    })
}

/// Coefficient of variation of prices; needs two priced records and a non-zero mean
pub fn price_dispersion(records: &[CompetitorRecord]) -> Option<PriceDispersion> {
    let values = prices(records);
    if values.len() < 2 {
        return None;
    }

    let cv = PriceStats::from_values(&values)?.coefficient_of_variation()?;
    Some(PriceDispersion {
        coefficient_of_variation: cv,
        level: DispersionLevel::from_cv(cv),
    })
}

/// Ordinary least squares slope of `values` against their indices
pub fn linear_trend(values: &[f64]) -> Option<Trend> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|x| x as f64).sum();
    let sum_x2: f64 = (0..n).map(|x| (x * x) as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(x, y)| x as f64 * y).sum();

    let denominator = n_f * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    Some(Trend {
        slope,
        direction: TrendDirection::from_slope(slope),
    })
}

/// Record counts per UTC date, ascending
pub fn daily_activity(records: &[CompetitorRecord]) -> Vec<(NaiveDate, usize)> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        *days.entry(record.last_updated.date_naive()).or_default() += 1;
    }
    days.into_iter().collect()
}

/// Mean price per UTC date, ascending. Days without prices are skipped.
pub fn daily_mean_price(records: &[CompetitorRecord]) -> Vec<(NaiveDate, f64)> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let Some(price) = record.price.filter(|p| p.is_finite()) {
            let entry = days.entry(record.last_updated.date_naive()).or_default();
            entry.0 += price;
            entry.1 += 1;
        }
    }
    days.into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect()
}

/// Distinct companies seen per UTC date, ascending
pub fn daily_unique_companies(records: &[CompetitorRecord]) -> Vec<(NaiveDate, usize)> {
    let mut days: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for record in records {
        days.entry(record.last_updated.date_naive())
            .or_default()
            .insert(record.company.as_str());
    }
    days.into_iter().map(|(day, companies)| (day, companies.len())).collect()
}

/// Trend of daily record counts
pub fn activity_trend(records: &[CompetitorRecord]) -> Option<Trend> {
    let counts: Vec<f64> = daily_activity(records)
        .into_iter()
        .map(|(_, count)| count as f64)
        .collect();
    linear_trend(&counts)
}

/// Trend of daily mean prices
pub fn price_trend(records: &[CompetitorRecord]) -> Option<Trend> {
    let means: Vec<f64> = daily_mean_price(records)
        .into_iter()
        .map(|(_, mean)| mean)
        .collect();
    linear_trend(&means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(company: &str, price: Option<f64>, day: u32) -> CompetitorRecord {
        CompetitorRecord::builder(company, "https://example.com")
            .price(price)
            .last_updated(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap())
            .build()
    }

    #[test]
    fn test_single_company_fully_concentrated() {
        let records = vec![record("Acme", None, 1), record("Acme", None, 2)];
        let c = market_concentration(&records).unwrap();

        assert!((c.hhi - 10_000.0).abs() < 1e-9);
        assert_eq!(c.level, ConcentrationLevel::HighlyConcentrated);
    }

    #[test]
    fn test_even_split_is_competitive() {
        let records: Vec<_> = ["A", "B", "C", "D", "E", "F", "G", "H"]
            .iter()
            .map(|c| record(c, None, 1))
            .collect();
        let c = market_concentration(&records).unwrap();

        assert!((c.hhi - 1250.0).abs() < 1e-9);
        assert_eq!(c.level, ConcentrationLevel::Competitive);
        assert!(market_concentration(&[]).is_none());
    }

    #[test]
    fn test_moderate_concentration() {
        // * Four equal shares -> exactly 2500, which is not above the high threshold
        let four: Vec<_> = ["A", "B", "C", "D"].iter().map(|c| record(c, None, 1)).collect();
        let c = market_concentration(&four).unwrap();
        assert_eq!(c.level, ConcentrationLevel::ModeratelyConcentrated);
    }

    #[test]
    fn test_price_dispersion() {
        let records = vec![
            record("A", Some(10.0), 1),
            record("B", Some(100.0), 1),
            record("C", None, 1),
        ];
        let d = price_dispersion(&records).unwrap();
        assert_eq!(d.level, DispersionLevel::High);

        let tight = vec![record("A", Some(100.0), 1), record("B", Some(101.0), 1)];
        assert_eq!(price_dispersion(&tight).unwrap().level, DispersionLevel::Low);

        assert!(price_dispersion(&[record("A", Some(5.0), 1)]).is_none());
    }

    #[test]
    fn test_linear_trend_directions() {
        let up = linear_trend(&[100.0, 105.0, 110.0, 115.0, 120.0]).unwrap();
        assert!((up.slope - 5.0).abs() < 1e-9);
        assert_eq!(up.direction, TrendDirection::Increasing);

        let down = linear_trend(&[5.0, 3.0, 1.0]).unwrap();
        assert_eq!(down.direction, TrendDirection::Decreasing);

        let flat = linear_trend(&[2.0, 2.05, 2.0]).unwrap();
        assert_eq!(flat.direction, TrendDirection::Stable);

        assert!(linear_trend(&[1.0]).is_none());
        assert!(linear_trend(&[]).is_none());
    }

    #[test]
    fn test_activity_trend_by_day() {
        let records = vec![
            record("A", None, 1),
            record("A", None, 2),
            record("B", None, 2),
            record("A", None, 3),
            record("B", None, 3),
            record("C", None, 3),
        ];

        let days = daily_activity(&records);
        assert_eq!(days.iter().map(|(_, c)| *c).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(activity_trend(&records).unwrap().direction, TrendDirection::Increasing);
    }

    #[test]
    fn test_price_trend_by_day() {
        let records = vec![
            record("A", Some(50.0), 1),
            record("B", Some(30.0), 2),
            record("C", Some(10.0), 3),
        ];
        assert_eq!(price_trend(&records).unwrap().direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_category_distribution_order() {
        let mut records = vec![record("A", None, 1), record("B", None, 1), record("C", None, 1)];
        records[0].category = "SaaS".into();
        records[1].category = "Fintech".into();
        records[2].category = "SaaS".into();

        let dist = category_distribution(&records);
        assert_eq!(dist, vec![("SaaS".to_string(), 2), ("Fintech".to_string(), 1)]);
    }

    #[test]
    fn test_levels_serialize_as_labels() {
        let json = serde_json::to_string(&ConcentrationLevel::HighlyConcentrated).unwrap();
        assert_eq!(json, "\"Highly Concentrated\"");
        let json = serde_json::to_string(&DispersionLevel::High).unwrap();
        assert_eq!(json, "\"High Dispersion\"");

        for level in [DispersionLevel::High, DispersionLevel::Moderate, DispersionLevel::Low] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
            assert_eq!(serde_json::from_str::<DispersionLevel>(&json).unwrap(), level);
        }
        assert_eq!(serde_json::to_string(&TrendDirection::Stable).unwrap(), "\"Stable\"");
    }

    #[test]
    fn test_unique_companies_by_day() {
        let records = vec![
            record("A", None, 1),
            record("A", None, 1),
            record("A", None, 2),
            record("B", None, 2),
        ];
        let days = daily_unique_companies(&records);
        assert_eq!(days.iter().map(|(_, c)| *c).collect::<Vec<_>>(), vec![1, 2]);
    }
}
