//! Human-readable digest of a run.

use anyhow::Result;
use std::fmt::Write;

use super::ConsoleReporter;
use crate::core::results::{BenchmarkReport, Callout};
use crate::core::settings::SamplingMode;
use crate::shared::constants::RULE;

pub struct SummaryReporter;

impl SummaryReporter {
    pub fn format(report: &BenchmarkReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", RULE)?;
        writeln!(output, "CAMERA BENCHMARK SUMMARY")?;
        writeln!(output, "{}", RULE)?;
        writeln!(output, "Run:       {}", report.run_id)?;
        writeln!(output, "Started:   {}", report.started_at)?;
        writeln!(
            output,
            "Device:    {}:{} ({})",
            report.device.address, report.device.port, report.device.source
        )?;
        writeln!(
            output,
            "Host:      {} {} ({}), {} cores",
            report.host.os_name, report.host.os_version, report.host.arch, report.host.cpu_cores
        )?;
        let sampling = &report.sampling;
        let window = match sampling.mode {
            SamplingMode::Duration => format!("{}s window", sampling.duration_secs),
            SamplingMode::Frames => format!("{} frames", sampling.max_frames),
        };
        writeln!(
            output,
            "Sampling:  {}, {}ms frame timeout, {} consecutive drops allowed",
            window, sampling.frame_timeout_ms, sampling.max_consecutive_drops
        )?;
        writeln!(output)?;

        for result in &report.results {
            writeln!(
                output,
                "{:<11} {:<11} {}",
                result.label,
                result.status.label(),
                ConsoleReporter::details(result)
            )?;
        }
        writeln!(output)?;

        let summary = &report.summary;
        writeln!(
            output,
            "Results:   {} ok, {} incomplete, {} failed",
            summary.ok, summary.incomplete, summary.failed
        )?;
        Self::callout(&mut output, "Best FPS:", &summary.best_fps, 2)?;
        Self::callout(&mut output, "Worst FPS:", &summary.worst_fps, 2)?;
        Self::callout(&mut output, "Most stable:", &summary.most_stable, 4)?;
        Self::callout(&mut output, "Least stable:", &summary.least_stable, 4)?;
        writeln!(output, "{}", RULE)?;

        Ok(output)
    }

    fn callout(
        output: &mut String,
        title: &str,
        callout: &Option<Callout>,
        precision: usize,
    ) -> std::fmt::Result {
        match callout {
            Some(c) => writeln!(
                output,
                "{:<14} {} ({:.*})",
                title, c.label, precision, c.value
            ),
            None => writeln!(output, "{:<14} n/a", title),
        }
    }
}
