// * Descriptive statistics over price-like values.
// * Std is the sample (n-1) formula; quantiles interpolate linearly between order statistics.

use serde::{Deserialize, Serialize};

/// Summary of a set of prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl PriceStats {
    /// Computes stats over finite values. Empty input yields `None`.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let count = sorted.len();
        if count == 0 {
            return None;
        }

        Some(Self {
            count,
            mean: mean(&sorted)?,
            median: quantile(&sorted, 0.5)?,
            min: sorted[0],
            max: sorted[count - 1],
            std: sample_std(&sorted)?,
        })
    }

    /// Coefficient of variation, `None` when the mean is zero
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.mean != 0.0).then(|| self.std / self.mean)
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Finite values in ascending order
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; 0.0 for a single value
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    let avg = mean(values)?;
    if n == 1 {
        return Some(0.0);
    }

    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (n - 1) as f64).sqrt())
}

/// Quantile of an ascending slice with linear interpolation
///
/// `q` is clamped to [0, 1]. Position is `q * (n - 1)`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_stats_basic() {
        let stats = PriceStats::from_values(&[10.0, 20.0, 30.0, 40.0]).unwrap();

        assert_eq!(stats.count, 4);
        assert!((stats.mean - 25.0).abs() < 1e-9);
        assert!((stats.median - 25.0).abs() < 1e-9);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 40.0);
        // * sqrt(500 / 3)
        assert!((stats.std - 12.909944487358056).abs() < 1e-9);
    }

    #[test]
    fn test_single_value_has_zero_std() {
        let stats = PriceStats::from_values(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.median, 42.0);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(PriceStats::from_values(&[]).is_none());
        assert!(PriceStats::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert!((quantile(&sorted, 0.25).unwrap() - 1.75).abs() < 1e-9);
        assert!((quantile(&sorted, 0.75).unwrap() - 3.25).abs() < 1e-9);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let stats = PriceStats::from_values(&[0.0, 0.0]).unwrap();
        assert!(stats.coefficient_of_variation().is_none());

        let stats = PriceStats::from_values(&[10.0, 30.0]).unwrap();
        let cv = stats.coefficient_of_variation().unwrap();
        assert!((cv - 14.142135623730951 / 20.0).abs() < 1e-9);
    }
}
