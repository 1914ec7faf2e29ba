use anyhow::{Context, Result};
use std::sync::atomic::AtomicBool;

use crate::core::results::BenchmarkReport;
use crate::core::runner::BenchmarkRunner;
use crate::core::settings::BenchmarkSettings;
use crate::report::{self, ReportArtifacts, SummaryReporter};
use crate::source::{Connector, Session};
use crate::utils::logger;

pub struct RunOutcome {
    pub report: BenchmarkReport,
    pub artifacts: ReportArtifacts,
}

/// Connect, run the configured matrix, write the reports.
///
/// A device that cannot be reached is the only error that ends the run
/// before anything is written.
pub fn run_benchmark(
    connector: &dyn Connector,
    settings: &BenchmarkSettings,
    cancel: Option<&AtomicBool>,
) -> Result<RunOutcome> {
    let address = settings.device_address();
    println!("Connecting to {} ...", address);
    let mut session = Session::open(connector, &address).map_err(|err| {
        logger::error(&err.to_string());
        err
    })?;
    println!("✓ {}", session.describe());

    let mut runner = BenchmarkRunner::new(settings);
    if let Some(flag) = cancel {
        runner = runner.with_cancel(flag);
    }
    let report = runner.run(&mut session, &settings.configurations);
    session.close();

    let artifacts = report::write_all(&report, &settings.output.dir)
        .with_context(|| format!("Failed to write reports for run {}", report.run_id))?;
    logger::info(&format!(
        "reports written to {}",
        settings.output.dir.display()
    ));

    println!();
    print!("{}", SummaryReporter::format(&report)?);
    println!("Reports:");
    for path in artifacts.paths() {
        println!("  {}", path.display());
    }

    Ok(RunOutcome { report, artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::RunStatus;
    use crate::core::settings::SamplingMode;
    use crate::error::SourceError;
    use crate::source::mock::{ScriptedConnector, SourceLog};
    use crate::source::{Resolution, StreamConfig};
    use std::fs;

    fn settings_in(dir: &std::path::Path) -> BenchmarkSettings {
        let mut settings = BenchmarkSettings::default();
        settings.sampling.mode = SamplingMode::Frames;
        settings.sampling.max_frames = 8;
        settings.sampling.frame_timeout_ms = 10;
        settings.output.dir = dir.join("out");
        settings.configurations = vec![
            StreamConfig::new(Resolution::Vga, 15),
            StreamConfig::new(Resolution::Qvga, 30),
        ];
        settings
    }

    #[test]
    fn unreachable_device_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let connector = ScriptedConnector::new(SourceLog::default()).unreachable();

        let err = run_benchmark(&connector, &settings, None).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Connection { .. })
        ));
        assert!(!settings.output.dir.exists());
    }

    #[test]
    fn partial_failure_still_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let log = SourceLog::default();
        let connector =
            ScriptedConnector::new(log.clone()).rejecting(StreamConfig::new(Resolution::Qvga, 30));

        let outcome = run_benchmark(&connector, &settings, None).unwrap();
        let statuses: Vec<RunStatus> = outcome.report.results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [RunStatus::Ok, RunStatus::Failed]);
        assert_eq!(fs::read_dir(&settings.output.dir).unwrap().count(), 4);
        assert_eq!(log.disconnects(), 1);
    }
}
