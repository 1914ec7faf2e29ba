//! One-line status output per configuration.

use crate::core::results::{ConfigurationResult, RunStatus};

pub struct ConsoleReporter;

impl ConsoleReporter {
    /// `  ✓ ok          VGA_15fps   14.97 fps ...`
    pub fn status_line(result: &ConfigurationResult) -> String {
        let marker = match result.status {
            RunStatus::Ok => "✓",
            RunStatus::Incomplete => "!",
            RunStatus::Failed => "✗",
        };
        format!(
            "  {} {:<11} {:<11} {}",
            marker,
            result.status.label(),
            result.label,
            Self::details(result)
        )
    }

    /// Metrics of a result, or why there are none.
    pub fn details(result: &ConfigurationResult) -> String {
        if let Some(failure) = &result.failure {
            return failure.clone();
        }

        let temporal = &result.temporal;
        let mut text = if temporal.is_defined() {
            format!(
                "{:.2} fps (eff {:.1}%)  jitter {:.3} ms  CV {:.1}%  drops {:.1}%",
                temporal.actual_fps,
                temporal.efficiency * 100.0,
                temporal.rms_jitter_ms,
                temporal.cv_percent,
                temporal.drop_rate * 100.0
            )
        } else {
            format!(
                "timing undefined  drops {:.1}% ({}/{})",
                temporal.drop_rate * 100.0,
                temporal.frames_dropped,
                temporal.frames_captured + temporal.frames_dropped
            )
        };
        let spatial = &result.spatial;
        match (spatial.stability_score, spatial.mean_frame_diff, spatial.std_frame_diff) {
            (Some(score), Some(mean), Some(std)) => text.push_str(&format!(
                "  stability {:.4}  frame diff {:.2}±{:.2}",
                score, mean, std
            )),
            (Some(score), _, _) => text.push_str(&format!("  stability {:.4}", score)),
            _ => text.push_str("  stability n/a"),
        }
        if let Some(reason) = &result.termination {
            text.push_str(&format!("  [{}]", reason));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::Termination;
    use crate::source::{Resolution, StreamConfig};

    #[test]
    fn failed_line_shows_reason() {
        let result = ConfigurationResult::failed(StreamConfig::new(Resolution::Qvga, 30), "rejected");
        let line = ConsoleReporter::status_line(&result);
        assert!(line.contains("✗ failed"));
        assert!(line.contains("QVGA_30fps"));
        assert!(line.ends_with("rejected"));
    }

    #[test]
    fn incomplete_line_shows_termination() {
        let mut result =
            ConfigurationResult::failed(StreamConfig::new(Resolution::Vga, 15), "placeholder");
        result.failure = None;
        result.status = RunStatus::Incomplete;
        result.termination = Some(Termination::Interrupted);
        let line = ConsoleReporter::status_line(&result);
        assert!(line.contains("! incomplete"));
        assert!(line.contains("timing undefined"));
        assert!(line.contains("stability n/a"));
        assert!(line.ends_with("[interrupted]"));
    }

    #[test]
    fn ok_line_shows_metrics() {
        let report = crate::core::runner::scripted_report(&[]);
        let line = ConsoleReporter::status_line(&report.results[0]);
        assert!(line.starts_with("  ✓ ok"));
        assert!(line.contains(" fps (eff "));
        assert!(line.contains("  CV 0.0%"));
        assert!(line.contains("stability 1.0000  frame diff 0.00±0.00"));
    }
}
