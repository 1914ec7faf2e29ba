use serde::{Deserialize, Serialize};

use super::SeriesStats;
use crate::error::AnalysisError;
use crate::source::FrameSample;

/// Frame timing statistics for one configuration. Intervals are in ms.
///
/// When `error` is set every derived figure is zero and must not be read as a
/// measurement; `drop_rate` is still computed from the counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalMetrics {
    pub target_fps: u32,
    pub frames_captured: usize,
    pub frames_dropped: usize,
    pub interval_count: usize,
    pub mean_interval_ms: f64,
    /// Standard deviation of the intervals.
    pub rms_jitter_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    pub peak_to_peak_ms: f64,
    pub cv_percent: f64,
    pub nominal_interval_ms: f64,
    /// RMS deviation of the intervals from the nominal interval.
    pub rms_nominal_deviation_ms: f64,
    pub actual_fps: f64,
    /// `actual_fps / target_fps`, unclamped.
    pub efficiency: f64,
    pub drop_rate: f64,
    pub error: Option<AnalysisError>,
}

impl TemporalMetrics {
    /// Degenerate record: counts only, everything derived zeroed and flagged.
    /// No interval is usable, so `interval_count` is 0.
    pub fn unavailable(
        target_fps: u32,
        frames_captured: usize,
        frames_dropped: usize,
        error: AnalysisError,
    ) -> Self {
        Self {
            target_fps,
            frames_captured,
            frames_dropped,
            interval_count: 0,
            mean_interval_ms: 0.0,
            rms_jitter_ms: 0.0,
            min_interval_ms: 0.0,
            max_interval_ms: 0.0,
            peak_to_peak_ms: 0.0,
            cv_percent: 0.0,
            nominal_interval_ms: nominal_interval_ms(target_fps),
            rms_nominal_deviation_ms: 0.0,
            actual_fps: 0.0,
            efficiency: 0.0,
            drop_rate: drop_rate(frames_captured, frames_dropped),
            error: Some(error),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.error.is_none()
    }
}

fn nominal_interval_ms(target_fps: u32) -> f64 {
    if target_fps == 0 {
        0.0
    } else {
        1000.0 / target_fps as f64
    }
}

/// Share of requested frames that never arrived.
pub fn drop_rate(captured: usize, dropped: usize) -> f64 {
    let requested = captured + dropped;
    if requested == 0 {
        0.0
    } else {
        dropped as f64 / requested as f64
    }
}

/// Consecutive timestamp deltas in ms.
///
/// Fails at the first delta that is not positive.
pub fn interval_series(samples: &[FrameSample]) -> Result<Vec<f64>, AnalysisError> {
    samples
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            match pair[1].timestamp.checked_sub(pair[0].timestamp) {
                Some(delta) if !delta.is_zero() => Ok(delta.as_secs_f64() * 1000.0),
                _ => Err(AnalysisError::NonMonotonicTimestamps { index: i + 1 }),
            }
        })
        .collect()
}

pub struct TemporalAnalyzer {
    target_fps: u32,
}

impl TemporalAnalyzer {
    pub fn new(target_fps: u32) -> Self {
        Self { target_fps }
    }

    pub fn analyze(&self, samples: &[FrameSample], frames_dropped: usize) -> TemporalMetrics {
        let captured = samples.len();
        if captured < 2 {
            return TemporalMetrics::unavailable(
                self.target_fps,
                captured,
                frames_dropped,
                AnalysisError::InsufficientData {
                    required: 2,
                    available: captured,
                },
            );
        }
        match interval_series(samples) {
            Ok(intervals) => self.analyze_intervals(&intervals, captured, frames_dropped),
            Err(err) => {
                TemporalMetrics::unavailable(self.target_fps, captured, frames_dropped, err)
            }
        }
    }

    /// Metrics from an already derived interval series.
    pub fn analyze_intervals(
        &self,
        intervals: &[f64],
        frames_captured: usize,
        frames_dropped: usize,
    ) -> TemporalMetrics {
        let Some(stats) = SeriesStats::of(intervals) else {
            return TemporalMetrics::unavailable(
                self.target_fps,
                frames_captured,
                frames_dropped,
                AnalysisError::InsufficientData {
                    required: 2,
                    available: frames_captured,
                },
            );
        };
        if !(stats.mean > 0.0) {
            return TemporalMetrics::unavailable(
                self.target_fps,
                frames_captured,
                frames_dropped,
                AnalysisError::ZeroMeanInterval,
            );
        }

        let nominal = nominal_interval_ms(self.target_fps);
        let actual_fps = 1000.0 / stats.mean;
        let efficiency = if self.target_fps == 0 {
            0.0
        } else {
            actual_fps / self.target_fps as f64
        };

        TemporalMetrics {
            target_fps: self.target_fps,
            frames_captured,
            frames_dropped,
            interval_count: stats.count,
            mean_interval_ms: stats.mean,
            rms_jitter_ms: stats.std_dev,
            min_interval_ms: stats.min,
            max_interval_ms: stats.max,
            peak_to_peak_ms: stats.max - stats.min,
            cv_percent: stats.std_dev / stats.mean * 100.0,
            nominal_interval_ms: nominal,
            rms_nominal_deviation_ms: SeriesStats::rms_about(intervals, nominal),
            actual_fps,
            efficiency,
            drop_rate: drop_rate(frames_captured, frames_dropped),
            error: None,
        }
    }
}
