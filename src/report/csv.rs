//! Per-configuration tables. Undefined metrics are left as empty cells.

use anyhow::Result;
use std::fmt::Write;

use crate::core::results::BenchmarkReport;

pub struct TableReporter;

impl TableReporter {
    pub fn temporal(report: &BenchmarkReport) -> Result<String> {
        let mut output = String::new();
        writeln!(
            output,
            "resolution,targetFps,status,actualFps,meanIntervalMs,rmsJitterMs,efficiency,dropRate"
        )?;
        for result in &report.results {
            let t = &result.temporal;
            let defined = t.is_defined();
            writeln!(
                output,
                "{},{},{},{},{},{},{},{}",
                result.config.resolution.label(),
                result.config.target_fps,
                result.status.label(),
                cell(defined.then_some(t.actual_fps)),
                cell(defined.then_some(t.mean_interval_ms)),
                cell(defined.then_some(t.rms_jitter_ms)),
                cell(defined.then_some(t.efficiency)),
                t.drop_rate
            )?;
        }
        Ok(output)
    }

    pub fn spatial(report: &BenchmarkReport) -> Result<String> {
        let mut output = String::new();
        writeln!(
            output,
            "resolution,targetFps,status,stabilityScore,meanFrameDiff,stdFrameDiff,maxFrameDiff"
        )?;
        for result in &report.results {
            let s = &result.spatial;
            writeln!(
                output,
                "{},{},{},{},{},{},{}",
                result.config.resolution.label(),
                result.config.target_fps,
                result.status.label(),
                cell(s.stability_score),
                cell(s.mean_frame_diff),
                cell(s.std_frame_diff),
                cell(s.max_frame_diff)
            )?;
        }
        Ok(output)
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::scripted_report;
    use crate::source::{Resolution, StreamConfig};

    #[test]
    fn one_row_per_configuration_in_run_order() {
        let report = scripted_report(&[StreamConfig::new(Resolution::Qvga, 15)]);
        let table = TableReporter::temporal(&report).unwrap();
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), 5);
        assert!(rows[1].starts_with("VGA,15,ok,"));
        assert!(rows[2].starts_with("VGA,30,ok,"));
        assert_eq!(rows[3], "QVGA,15,failed,,,,,0");
        assert!(rows.iter().all(|r| r.split(',').count() == 8));
    }

    #[test]
    fn spatial_table_has_stability_and_diff_columns() {
        let report = scripted_report(&[StreamConfig::new(Resolution::Vga, 15)]);
        let table = TableReporter::spatial(&report).unwrap();
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(
            rows[0],
            "resolution,targetFps,status,stabilityScore,meanFrameDiff,stdFrameDiff,maxFrameDiff"
        );
        assert_eq!(rows[1], "VGA,15,failed,,,,");
        assert_eq!(rows[2], "VGA,30,ok,1,0,0,0");
    }
}
