use std::sync::atomic::{AtomicBool, Ordering};

use crate::analyzer::temporal::interval_series;
use crate::analyzer::{SpatialAnalyzer, TemporalAnalyzer};
use crate::core::results::{BenchmarkReport, ConfigurationResult, DeviceInfo, ReportSummary};
use crate::core::sampler::{SamplingPlan, TemporalSampler};
use crate::core::settings::BenchmarkSettings;
use crate::report::ConsoleReporter;
use crate::shared::constants;
use crate::source::{Session, StreamConfig};
use crate::utils::logger;
use crate::utils::platform::HostInfo;

pub const SKIPPED_INTERRUPTED: &str = "skipped: interrupted";

/// Runs the configuration matrix one mode at a time on a single session.
///
/// Configurations never share the camera, and a failure in one is recorded
/// and left behind; only the connection itself is fatal, and that happens
/// before the runner exists.
pub struct BenchmarkRunner<'a> {
    settings: &'a BenchmarkSettings,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(settings: &'a BenchmarkSettings) -> Self {
        Self {
            settings,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn run(&self, session: &mut Session, configs: &[StreamConfig]) -> BenchmarkReport {
        let started = chrono::Local::now();
        let run_id = started.format(constants::RUN_ID_FORMAT).to_string();
        let plan = self.settings.sampling_plan();
        logger::info(&format!(
            "run {}: {} configurations on {}",
            run_id,
            configs.len(),
            session.describe()
        ));

        let mut results = Vec::with_capacity(configs.len());
        for (i, config) in configs.iter().enumerate() {
            println!("[{}/{}] {}", i + 1, configs.len(), config.label());
            let result = if self.cancelled() {
                logger::warn(&format!("{}: {}", config.label(), SKIPPED_INTERRUPTED));
                ConfigurationResult::failed(*config, SKIPPED_INTERRUPTED)
            } else {
                self.run_configuration(session, &plan, config)
            };
            println!("{}", ConsoleReporter::status_line(&result));
            results.push(result);
        }

        let summary = ReportSummary::from_results(&results);
        logger::info(&format!(
            "run {} finished: {} ok, {} incomplete, {} failed",
            run_id, summary.ok, summary.incomplete, summary.failed
        ));

        BenchmarkReport {
            run_id,
            started_at: started.to_rfc3339(),
            device: DeviceInfo {
                address: session.address().host.clone(),
                port: session.address().port,
                source: session.describe(),
            },
            host: HostInfo::detect(),
            sampling: self.settings.sampling.clone(),
            results,
            summary,
        }
    }

    fn run_configuration(
        &self,
        session: &mut Session,
        plan: &SamplingPlan,
        config: &StreamConfig,
    ) -> ConfigurationResult {
        if session.active_config() == Some(*config) {
            logger::debug(&format!("{}: stream already active", config.label()));
        }
        if let Err(err) = session.configure(config) {
            logger::error(&format!("{}: {}", config.label(), err));
            return ConfigurationResult::failed(*config, err.to_string());
        }

        let mut sampler = TemporalSampler::new(plan);
        if let Some(flag) = self.cancel {
            sampler = sampler.with_cancel(flag);
        }
        let run = sampler.sample(session.source_mut(), config);

        let temporal = TemporalAnalyzer::new(config.target_fps).analyze(&run.samples, run.frames_dropped);
        if let Some(err) = &temporal.error {
            logger::warn(&format!("{}: temporal metrics undefined: {}", config.label(), err));
        }
        let spatial = SpatialAnalyzer::new().analyze(&run.samples);
        if let Some(err) = &spatial.error {
            logger::warn(&format!("{}: spatial metrics undefined: {}", config.label(), err));
        }
        for warning in &spatial.warnings {
            logger::warn(&format!("{}: {:?}", config.label(), warning));
        }

        let intervals = if self.settings.output.export_intervals {
            interval_series(&run.samples).ok()
        } else {
            None
        };
        ConfigurationResult::from_run(*config, &run, temporal, spatial, intervals)
    }
}

/// Report from a scripted session in count-bound mode, for report tests.
#[cfg(test)]
pub(crate) fn scripted_report(rejected: &[StreamConfig]) -> BenchmarkReport {
    use crate::core::settings::SamplingMode;
    use crate::source::mock::{ScriptedConnector, SourceLog};

    let mut settings = BenchmarkSettings::default();
    settings.sampling.mode = SamplingMode::Frames;
    settings.sampling.max_frames = 10;
    settings.sampling.frame_timeout_ms = 10;
    settings.sampling.spatial_frames = 5;

    let mut connector = ScriptedConnector::new(SourceLog::default());
    for config in rejected {
        connector = connector.rejecting(*config);
    }
    let mut session = match Session::open(&connector, &settings.device_address()) {
        Ok(session) => session,
        Err(err) => panic!("scripted connector refused: {}", err),
    };
    BenchmarkRunner::new(&settings).run(&mut session, &settings.configurations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::RunStatus;
    use crate::core::sampler::Termination;
    use crate::core::settings::SamplingMode;
    use crate::source::mock::{ScriptedConnector, SourceLog, Step};
    use crate::source::Resolution;

    fn count_bound(frames: usize) -> BenchmarkSettings {
        let mut settings = BenchmarkSettings::default();
        settings.sampling.mode = SamplingMode::Frames;
        settings.sampling.max_frames = frames;
        settings.sampling.frame_timeout_ms = 10;
        settings.sampling.max_consecutive_drops = 2;
        settings
    }

    fn open(connector: &ScriptedConnector, settings: &BenchmarkSettings) -> Session {
        Session::open(connector, &settings.device_address()).ok().unwrap()
    }

    #[test]
    fn rejected_mode_fails_alone_and_order_is_kept() {
        let vga15 = StreamConfig::new(Resolution::Vga, 15);
        let qvga30 = StreamConfig::new(Resolution::Qvga, 30);
        let settings = count_bound(10);
        let log = SourceLog::default();
        let connector = ScriptedConnector::new(log.clone()).rejecting(qvga30);
        let mut session = open(&connector, &settings);

        let report = BenchmarkRunner::new(&settings).run(&mut session, &[vga15, qvga30]);

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].label, "VGA_15fps");
        assert_eq!(report.results[0].status, RunStatus::Ok);
        assert_eq!(report.results[1].label, "QVGA_30fps");
        assert_eq!(report.results[1].status, RunStatus::Failed);
        assert!(report.results[1]
            .failure
            .as_deref()
            .is_some_and(|f| f.contains("QVGA_30fps")));
        assert_eq!((report.summary.ok, report.summary.failed), (1, 1));
        assert_eq!(log.configures(), 2);
    }

    #[test]
    fn intervals_are_exported_when_enabled() {
        let settings = count_bound(10);
        let connector = ScriptedConnector::new(SourceLog::default());
        let mut session = open(&connector, &settings);
        let config = StreamConfig::new(Resolution::Qvga, 15);

        let report = BenchmarkRunner::new(&settings).run(&mut session, &[config]);
        let result = &report.results[0];
        assert_eq!(result.temporal.frames_captured, 10);
        assert_eq!(result.intervals_ms.as_ref().map(Vec::len), Some(9));
        assert_eq!(result.spatial.stability_score, Some(1.0));

        let mut quiet = count_bound(10);
        quiet.output.export_intervals = false;
        let report = BenchmarkRunner::new(&quiet).run(&mut session, &[config]);
        assert!(report.results[0].intervals_ms.is_none());
    }

    #[test]
    fn excessive_drops_mark_incomplete_and_run_continues() {
        let settings = count_bound(5);
        let connector =
            ScriptedConnector::new(SourceLog::default()).with_script(vec![Step::Timeout; 3]);
        let mut session = open(&connector, &settings);
        let configs = [
            StreamConfig::new(Resolution::Vga, 30),
            StreamConfig::new(Resolution::Qvga, 30),
        ];

        let report = BenchmarkRunner::new(&settings).run(&mut session, &configs);
        assert_eq!(report.results[0].status, RunStatus::Incomplete);
        assert_eq!(
            report.results[0].termination,
            Some(Termination::ExcessiveDrops { consecutive: 3 })
        );
        assert_eq!(report.results[0].temporal.drop_rate, 1.0);
        assert_eq!(report.results[1].status, RunStatus::Ok);
    }

    #[test]
    fn interrupt_skips_remaining_configurations() {
        let settings = count_bound(5);
        let connector = ScriptedConnector::new(SourceLog::default());
        let mut session = open(&connector, &settings);
        let flag = AtomicBool::new(true);

        let report = BenchmarkRunner::new(&settings)
            .with_cancel(&flag)
            .run(&mut session, &settings.configurations);
        assert_eq!(report.results.len(), 4);
        assert!(report
            .results
            .iter()
            .all(|r| r.failure.as_deref() == Some(SKIPPED_INTERRUPTED)));
    }

    #[test]
    fn report_carries_run_metadata() {
        let report = scripted_report(&[]);
        assert_eq!(report.run_id.len(), "20240101_120000".len());
        assert_eq!(report.device.address, "172.15.1.29");
        assert_eq!(report.device.port, 9559);
        assert_eq!(report.device.source, "scripted test source");
        assert_eq!(report.sampling.max_frames, 10);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.started_at).is_ok());
    }
}
