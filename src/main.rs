mod analyzer;
mod core;
mod error;
mod report;
mod shared;
mod source;
mod sync;
mod utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::settings::{BenchmarkSettings, SamplingMode};
use crate::source::simulated::SimulatedConnector;
use crate::source::{Connector, SourceKind, StreamConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark frame timing and stability for every configured stream mode
    Run {
        /// Device backend (defaults to stream when built with opencv)
        #[arg(short, long, value_enum)]
        source: Option<SourceKind>,
        #[command(flatten)]
        overrides: SettingsArgs,
    },
    /// Print the effective settings as JSON
    ShowConfig {
        #[command(flatten)]
        overrides: SettingsArgs,
    },
    /// Detect platform info
    Detect,
}

/// Command-line overrides on top of the settings file.
#[derive(Args, Debug, Default)]
struct SettingsArgs {
    /// Settings file (default: ./camjitter.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Device IP address [default: 172.15.1.29]
    #[arg(short, long)]
    address: Option<String>,
    /// Device port [default: 9559]
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Sampling window per configuration, in seconds
    #[arg(short, long, conflicts_with = "frames")]
    duration: Option<f64>,
    /// Sample a fixed number of frames instead of a time window
    #[arg(short, long)]
    frames: Option<usize>,
    #[arg(long)]
    frame_timeout_ms: Option<u64>,
    #[arg(long)]
    max_consecutive_drops: Option<u32>,
    /// Comma-separated modes, e.g. VGA_15fps,QVGA_30fps
    #[arg(short, long, value_delimiter = ',')]
    matrix: Option<Vec<StreamConfig>>,
    /// Leave raw interval series out of the JSON report
    #[arg(long)]
    no_intervals: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<BenchmarkSettings> {
        let mut settings = BenchmarkSettings::load(self.config.as_deref())?;
        if let Some(address) = &self.address {
            settings.device.address = address.clone();
        }
        if let Some(port) = self.port {
            settings.device.port = port;
        }
        if let Some(dir) = &self.output_dir {
            settings.output.dir = dir.clone();
        }
        if let Some(secs) = self.duration {
            settings.sampling.mode = SamplingMode::Duration;
            settings.sampling.duration_secs = secs;
        }
        if let Some(frames) = self.frames {
            settings.sampling.mode = SamplingMode::Frames;
            settings.sampling.max_frames = frames;
        }
        if let Some(ms) = self.frame_timeout_ms {
            settings.sampling.frame_timeout_ms = ms;
        }
        if let Some(drops) = self.max_consecutive_drops {
            settings.sampling.max_consecutive_drops = drops;
        }
        if let Some(matrix) = &self.matrix {
            settings.configurations = matrix.clone();
        }
        if self.no_intervals {
            settings.output.export_intervals = false;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn connector_for(kind: SourceKind, settings: &BenchmarkSettings) -> Result<Box<dyn Connector>> {
    match kind {
        SourceKind::Simulated => Ok(Box::new(SimulatedConnector::new(settings.simulation.clone()))),
        #[cfg(feature = "opencv")]
        SourceKind::Stream => Ok(Box::new(crate::source::video::StreamConnector::new(
            settings.device.stream_url.clone(),
        ))),
        #[cfg(not(feature = "opencv"))]
        SourceKind::Stream => {
            anyhow::bail!("the stream source needs a build with `--features opencv`")
        }
    }
}

fn default_source() -> SourceKind {
    if cfg!(feature = "opencv") {
        SourceKind::Stream
    } else {
        SourceKind::Simulated
    }
}

fn main() -> Result<()> {
    crate::utils::logger::init(Path::new("."));

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { source, overrides } => {
            let settings = overrides.resolve()?;
            let connector = connector_for(source.unwrap_or_else(default_source), &settings)?;

            let cancel = Arc::new(AtomicBool::new(false));
            let flag = cancel.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::SeqCst);
                eprintln!("\n! interrupted, finishing up and writing reports");
            })
            .context("Failed to install Ctrl-C handler")?;

            crate::core::launcher::run_benchmark(connector.as_ref(), &settings, Some(&*cancel))?;
        }
        Commands::ShowConfig { overrides } => {
            let settings = overrides.resolve()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Detect => {
            let info = crate::utils::platform::HostInfo::detect();
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
