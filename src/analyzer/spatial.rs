use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::SeriesStats;
use crate::error::AnalysisError;
use crate::shared::constants::MAX_GREY_LEVEL;
use crate::source::{Frame, FrameSample};

/// Non-fatal problems found while comparing frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpatialWarning {
    /// Pair skipped because the two frames differ in size.
    DimensionMismatch {
        pair_index: usize,
        previous: (u32, u32),
        current: (u32, u32),
    },
    /// Frame buffer does not match its declared shape; pairs touching it are skipped.
    UndecodableFrame { frame_index: usize },
}

/// Frame-to-frame similarity of one configuration.
///
/// Differences are mean absolute grey-level differences (0..=255) per
/// consecutive pair. `stability_score` is `1 - mean_diff / 255`, so identical
/// frames score 1.0 and black against white scores 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialMetrics {
    pub frames_analyzed: usize,
    pub pairs_compared: usize,
    pub pairs_excluded: usize,
    pub stability_score: Option<f64>,
    pub mean_frame_diff: Option<f64>,
    pub std_frame_diff: Option<f64>,
    pub max_frame_diff: Option<f64>,
    /// `1 / (1 + mean_diff)`, unbounded-difference variant of the score.
    pub inverse_difference_score: Option<f64>,
    pub pair_diffs: Vec<f64>,
    pub warnings: Vec<SpatialWarning>,
    pub error: Option<AnalysisError>,
}

impl SpatialMetrics {
    pub fn unavailable(frames_analyzed: usize, error: AnalysisError) -> Self {
        Self {
            frames_analyzed,
            pairs_compared: 0,
            pairs_excluded: 0,
            stability_score: None,
            mean_frame_diff: None,
            std_frame_diff: None,
            max_frame_diff: None,
            inverse_difference_score: None,
            pair_diffs: Vec::new(),
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.stability_score.is_some()
    }
}

enum PairOutcome {
    Compared(f64),
    Skipped(Option<SpatialWarning>),
}

#[derive(Default)]
pub struct SpatialAnalyzer;

impl SpatialAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, samples: &[FrameSample]) -> SpatialMetrics {
        let frames: Vec<&Frame> = samples.iter().filter_map(|s| s.frame.as_ref()).collect();
        if frames.len() < 2 {
            return SpatialMetrics::unavailable(
                frames.len(),
                AnalysisError::InsufficientData {
                    required: 2,
                    available: frames.len(),
                },
            );
        }

        let grays: Vec<Option<GrayImage>> = frames.par_iter().map(|f| f.to_gray()).collect();
        let mut warnings: Vec<SpatialWarning> = grays
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_none())
            .map(|(frame_index, _)| SpatialWarning::UndecodableFrame { frame_index })
            .collect();

        let outcomes: Vec<PairOutcome> = grays
            .par_windows(2)
            .enumerate()
            .map(|(pair_index, pair)| match (&pair[0], &pair[1]) {
                (Some(previous), Some(current)) => {
                    if previous.dimensions() != current.dimensions() {
                        PairOutcome::Skipped(Some(SpatialWarning::DimensionMismatch {
                            pair_index,
                            previous: previous.dimensions(),
                            current: current.dimensions(),
                        }))
                    } else {
                        match mean_abs_difference(previous, current) {
                            Some(diff) => PairOutcome::Compared(diff),
                            None => PairOutcome::Skipped(None),
                        }
                    }
                }
                _ => PairOutcome::Skipped(None),
            })
            .collect();

        let mut pair_diffs = Vec::with_capacity(outcomes.len());
        let mut pairs_excluded = 0;
        for outcome in outcomes {
            match outcome {
                PairOutcome::Compared(diff) => pair_diffs.push(diff),
                PairOutcome::Skipped(warning) => {
                    pairs_excluded += 1;
                    warnings.extend(warning);
                }
            }
        }

        let Some(stats) = SeriesStats::of(&pair_diffs) else {
            let mut metrics = SpatialMetrics::unavailable(
                frames.len(),
                AnalysisError::NoComparablePairs {
                    excluded: pairs_excluded,
                },
            );
            metrics.pairs_excluded = pairs_excluded;
            metrics.warnings = warnings;
            return metrics;
        };

        SpatialMetrics {
            frames_analyzed: frames.len(),
            pairs_compared: pair_diffs.len(),
            pairs_excluded,
            stability_score: Some(1.0 - stats.mean / MAX_GREY_LEVEL),
            mean_frame_diff: Some(stats.mean),
            std_frame_diff: Some(stats.std_dev),
            max_frame_diff: Some(stats.max),
            inverse_difference_score: Some(1.0 / (1.0 + stats.mean)),
            pair_diffs,
            warnings,
            error: None,
        }
    }
}

/// Mean absolute grey-level difference of two same-sized images.
fn mean_abs_difference(a: &GrayImage, b: &GrayImage) -> Option<f64> {
    let (a, b) = (a.as_raw(), b.as_raw());
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let total: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    Some(total as f64 / a.len() as f64)
}
