//! Metrics computed over one sampling run.

pub mod spatial;
pub mod temporal;

pub use spatial::{SpatialAnalyzer, SpatialMetrics, SpatialWarning};
pub use temporal::{TemporalAnalyzer, TemporalMetrics};

/// Population statistics over a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    /// `None` for an empty series.
    ///
    /// Sums are taken relative to the first value, so a constant series yields
    /// that value as its exact mean and a standard deviation of exactly zero.
    pub fn of(values: &[f64]) -> Option<Self> {
        let (&first, _) = values.split_first()?;
        let n = values.len() as f64;

        let shift_sum: f64 = values.iter().map(|v| v - first).sum();
        let mean = first + shift_sum / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Some(Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }

    /// Root mean square of the deviation from `reference`.
    pub fn rms_about(values: &[f64], reference: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let sum: f64 = values.iter().map(|v| (v - reference).powi(2)).sum();
        (sum / values.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_stats() {
        assert!(SeriesStats::of(&[]).is_none());
    }

    #[test]
    fn constant_series_is_exact() {
        let values = vec![33.333333333333336; 97];
        let stats = SeriesStats::of(&values).unwrap();
        assert_eq!(stats.mean, 33.333333333333336);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.min, stats.max);
    }

    #[test]
    fn population_std_dev() {
        let stats = SeriesStats::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert_eq!((stats.min, stats.max), (2.0, 9.0));
    }

    #[test]
    fn rms_about_reference() {
        assert!((SeriesStats::rms_about(&[1.0, 3.0], 2.0) - 1.0).abs() < 1e-12);
        assert_eq!(SeriesStats::rms_about(&[], 2.0), 0.0);
    }
}
