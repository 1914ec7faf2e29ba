//! Report output.
//!
//! A finished [`BenchmarkReport`] is written as four artifacts sharing the
//! run id: the raw JSON record, a temporal CSV table, a spatial CSV table and
//! a plain-text digest.

mod console;
mod csv;
mod json;
mod summary;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::results::BenchmarkReport;
use crate::shared::constants;
use crate::utils::file_utils;

pub use console::ConsoleReporter;
pub use csv::TableReporter;
pub use json::JsonReporter;
pub use summary::SummaryReporter;

/// Where the artifacts of one run were written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifacts {
    pub json: PathBuf,
    pub temporal_csv: PathBuf,
    pub spatial_csv: PathBuf,
    pub summary: PathBuf,
}

impl ReportArtifacts {
    pub fn for_run(dir: &Path, run_id: &str) -> Self {
        let path = |prefix: &str, ext: &str| dir.join(format!("{}_{}.{}", prefix, run_id, ext));
        Self {
            json: path(constants::REPORT_JSON_PREFIX, "json"),
            temporal_csv: path(constants::TEMPORAL_CSV_PREFIX, "csv"),
            spatial_csv: path(constants::SPATIAL_CSV_PREFIX, "csv"),
            summary: path(constants::SUMMARY_PREFIX, "txt"),
        }
    }

    pub fn paths(&self) -> [&Path; 4] {
        [
            &self.json,
            &self.temporal_csv,
            &self.spatial_csv,
            &self.summary,
        ]
    }
}

/// Render every artifact, then write them into `dir`.
pub fn write_all(report: &BenchmarkReport, dir: &Path) -> Result<ReportArtifacts> {
    let json = JsonReporter::format(report, true)?;
    let temporal = TableReporter::temporal(report)?;
    let spatial = TableReporter::spatial(report)?;
    let digest = SummaryReporter::format(report)?;

    file_utils::ensure_dir(dir)?;
    let artifacts = ReportArtifacts::for_run(dir, &report.run_id);
    file_utils::write_text(&artifacts.json, &json)?;
    file_utils::write_text(&artifacts.temporal_csv, &temporal)?;
    file_utils::write_text(&artifacts.spatial_csv, &spatial)?;
    file_utils::write_text(&artifacts.summary, &digest)?;
    Ok(artifacts)
}
