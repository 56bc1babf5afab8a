// * Outlier detection over a numeric record field.

use super::stats::{mean, quantile, sample_std, sorted_finite};
use crate::config::constants::{IQR_FENCE_FACTOR, MIN_OUTLIER_SAMPLE, ZSCORE_THRESHOLD};
use crate::persistence::schema::CompetitorRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Outside [Q1 - 1.5 IQR, Q3 + 1.5 IQR]
    #[default]
    Iqr,
    /// |z| above 2.5
    ZScore,
}

impl FromStr for OutlierMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" | "z" => Ok(Self::ZScore),
            other => Err(format!("unknown outlier method: {}", other)),
        }
    }
}

/// Numeric record fields that can be screened for outliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    #[default]
    Price,
    ContentLength,
}

impl RecordField {
    /// Field value, `None` when the record has no usable value
    pub fn value(&self, record: &CompetitorRecord) -> Option<f64> {
        match self {
            Self::Price => record.price.filter(|p| p.is_finite()),
            Self::ContentLength => Some(record.content_len() as f64),
        }
    }
}

impl FromStr for RecordField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "content_length" | "content-length" | "length" => Ok(Self::ContentLength),
            other => Err(format!("unknown record field: {}", other)),
        }
    }
}

/// Returns the records whose `field` is an outlier, in input order
///
/// Records without a value are ignored. Fewer than four valued records yields
/// an empty result, as does a zero standard deviation under the z-score method.
pub fn detect_outliers(
    records: &[CompetitorRecord],
    field: RecordField,
    method: OutlierMethod,
) -> Vec<CompetitorRecord> {
    let valued: Vec<(&CompetitorRecord, f64)> = records
        .iter()
        .filter_map(|r| field.value(r).map(|v| (r, v)))
        .collect();

    if valued.len() < MIN_OUTLIER_SAMPLE {
        return Vec::new();
    }

    let values: Vec<f64> = valued.iter().map(|(_, v)| *v).collect();
    let Some(is_outlier) = outlier_rule(&values, method) else {
        return Vec::new();
    };

    valued
        .into_iter()
        .filter(|(_, v)| is_outlier(*v))
        .map(|(r, _)| r.clone())
        .collect()
}

// * Builds the membership test for a method, `None` when the sample cannot be screened
fn outlier_rule(values: &[f64], method: OutlierMethod) -> Option<Box<dyn Fn(f64) -> bool>> {
    match method {
        OutlierMethod::Iqr => {
            let sorted = sorted_finite(values);
            let q1 = quantile(&sorted, 0.25)?;
            let q3 = quantile(&sorted, 0.75)?;
            let iqr = q3 - q1;
            let lower = q1 - IQR_FENCE_FACTOR * iqr;
            let upper = q3 + IQR_FENCE_FACTOR * iqr;
            Some(Box::new(move |v| v < lower || v > upper))
        }
        OutlierMethod::ZScore => {
            let avg = mean(values)?;
            let std = sample_std(values)?;
            if std == 0.0 {
                return None;
            }
            Some(Box::new(move |v| ((v - avg) / std).abs() > ZSCORE_THRESHOLD))
        }
    }
}
