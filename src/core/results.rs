//! Result records produced by a benchmark run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::{SpatialMetrics, TemporalMetrics};
use crate::core::sampler::{SampleRun, Termination};
use crate::core::settings::SamplingSettings;
use crate::error::AnalysisError;
use crate::source::StreamConfig;
use crate::utils::platform::HostInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Incomplete,
    Failed,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Ok => "ok",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationResult {
    pub label: String,
    pub config: StreamConfig,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
    pub elapsed_ms: f64,
    pub temporal: TemporalMetrics,
    pub spatial: SpatialMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals_ms: Option<Vec<f64>>,
}

impl ConfigurationResult {
    /// Record for a configuration that never produced a sampling run.
    pub fn failed(config: StreamConfig, reason: impl Into<String>) -> Self {
        let no_data = AnalysisError::InsufficientData {
            required: 2,
            available: 0,
        };
        Self {
            label: config.label(),
            config,
            status: RunStatus::Failed,
            failure: Some(reason.into()),
            termination: None,
            elapsed_ms: 0.0,
            temporal: TemporalMetrics::unavailable(config.target_fps, 0, 0, no_data.clone()),
            spatial: SpatialMetrics::unavailable(0, no_data),
            intervals_ms: None,
        }
    }

    /// Early termination or unusable timing makes a run incomplete.
    pub fn from_run(
        config: StreamConfig,
        run: &SampleRun,
        temporal: TemporalMetrics,
        spatial: SpatialMetrics,
        intervals_ms: Option<Vec<f64>>,
    ) -> Self {
        let status = if !run.is_complete() || !temporal.is_defined() {
            RunStatus::Incomplete
        } else {
            RunStatus::Ok
        };
        Self {
            label: config.label(),
            config,
            status,
            failure: None,
            termination: run.termination.clone(),
            elapsed_ms: run.elapsed.as_secs_f64() * 1000.0,
            temporal,
            spatial,
            intervals_ms,
        }
    }
}

/// A configuration singled out in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub ok: usize,
    pub incomplete: usize,
    pub failed: usize,
    pub best_fps: Option<Callout>,
    pub worst_fps: Option<Callout>,
    pub most_stable: Option<Callout>,
    pub least_stable: Option<Callout>,
}

impl ReportSummary {
    /// Best/worst only consider results whose metric is defined; ties go to
    /// the configuration that ran first.
    pub fn from_results(results: &[ConfigurationResult]) -> Self {
        let count = |status: RunStatus| results.iter().filter(|r| r.status == status).count();

        let fps: Vec<(&str, f64)> = results
            .iter()
            .filter(|r| r.temporal.is_defined())
            .map(|r| (r.label.as_str(), r.temporal.actual_fps))
            .collect();
        let stability: Vec<(&str, f64)> = results
            .iter()
            .filter_map(|r| r.spatial.stability_score.map(|s| (r.label.as_str(), s)))
            .collect();

        Self {
            ok: count(RunStatus::Ok),
            incomplete: count(RunStatus::Incomplete),
            failed: count(RunStatus::Failed),
            best_fps: extreme(&fps, |candidate, current| candidate > current),
            worst_fps: extreme(&fps, |candidate, current| candidate < current),
            most_stable: extreme(&stability, |candidate, current| candidate > current),
            least_stable: extreme(&stability, |candidate, current| candidate < current),
        }
    }
}

fn extreme(values: &[(&str, f64)], beats: impl Fn(f64, f64) -> bool) -> Option<Callout> {
    let mut best: Option<(&str, f64)> = None;
    for &(label, value) in values {
        match best {
            Some((_, current)) if !beats(value, current) => {}
            _ => best = Some((label, value)),
        }
    }
    best.map(|(label, value)| Callout {
        label: label.to_string(),
        value,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub address: String,
    pub port: u16,
    pub source: String,
}

/// Everything one benchmark run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub run_id: String,
    pub started_at: String,
    pub device: DeviceInfo,
    pub host: HostInfo,
    pub sampling: SamplingSettings,
    pub results: Vec<ConfigurationResult>,
    pub summary: ReportSummary,
}
