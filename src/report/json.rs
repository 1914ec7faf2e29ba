//! Full-fidelity structured export.

use anyhow::{Context, Result};

use crate::core::results::BenchmarkReport;

pub struct JsonReporter;

impl JsonReporter {
    pub fn format(report: &BenchmarkReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }

    pub fn parse(content: &str) -> Result<BenchmarkReport> {
        serde_json::from_str(content).context("Failed to parse benchmark report JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::scripted_report;
    use crate::source::{Resolution, StreamConfig};

    const TOLERANCE: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE
    }

    fn close_opt(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => close(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn compact_output_is_single_line() {
        let report = scripted_report(&[]);
        let output = JsonReporter::format(&report, false).unwrap();
        assert!(!output.contains('\n'));
        assert!(output.contains("\"run_id\""));
    }

    #[test]
    fn round_trip_keeps_metrics() {
        let report = scripted_report(&[StreamConfig::new(Resolution::Qvga, 30)]);
        let parsed = JsonReporter::parse(&JsonReporter::format(&report, true).unwrap()).unwrap();

        assert_eq!(parsed.run_id, report.run_id);
        assert_eq!(parsed.results.len(), report.results.len());
        for (a, b) in report.results.iter().zip(&parsed.results) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.status, b.status);
            assert_eq!(a.temporal.error, b.temporal.error);
            assert!(close(a.temporal.actual_fps, b.temporal.actual_fps));
            assert!(close(a.temporal.mean_interval_ms, b.temporal.mean_interval_ms));
            assert!(close(a.temporal.rms_jitter_ms, b.temporal.rms_jitter_ms));
            assert!(close(a.temporal.efficiency, b.temporal.efficiency));
            assert!(close(a.temporal.drop_rate, b.temporal.drop_rate));
            assert!(close_opt(a.spatial.stability_score, b.spatial.stability_score));
            assert_eq!(a.spatial.pair_diffs.len(), b.spatial.pair_diffs.len());

            let intervals_a = a.intervals_ms.clone().unwrap_or_default();
            let intervals_b = b.intervals_ms.clone().unwrap_or_default();
            assert_eq!(intervals_a.len(), intervals_b.len());
            assert!(intervals_a.iter().zip(&intervals_b).all(|(x, y)| close(*x, *y)));
        }
        assert_eq!(parsed.summary.failed, 1);
    }

    #[test]
    fn failed_results_keep_their_reason() {
        let report = scripted_report(&[StreamConfig::new(Resolution::Vga, 15)]);
        let output = JsonReporter::format(&report, false).unwrap();
        assert!(output.contains("\"status\":\"failed\""));
        assert!(output.contains("\"kind\":\"insufficient_data\""));
    }
}
