//! Benchmark settings loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard four-mode matrix against the default device address.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::sampler::{SampleLimit, SamplingPlan};
use crate::error::SettingsError;
use crate::shared::constants;
use crate::source::simulated::SimulationProfile;
use crate::source::{DeviceAddress, StreamConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    pub device: DeviceSettings,
    pub sampling: SamplingSettings,
    pub output: OutputSettings,
    pub simulation: SimulationProfile,
    /// Modes to benchmark, in run order.
    pub configurations: Vec<StreamConfig>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            sampling: SamplingSettings::default(),
            output: OutputSettings::default(),
            simulation: SimulationProfile::default(),
            configurations: StreamConfig::default_matrix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub address: String,
    pub port: u16,
    /// Stream URL for the OpenCV backend; `{host}` and `{port}` are substituted.
    pub stream_url: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            address: constants::DEFAULT_DEVICE_ADDRESS.to_string(),
            port: constants::DEFAULT_DEVICE_PORT,
            stream_url: constants::DEFAULT_STREAM_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    Duration,
    Frames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub mode: SamplingMode,
    pub duration_secs: f64,
    pub max_frames: usize,
    pub frame_timeout_ms: u64,
    pub max_consecutive_drops: u32,
    /// Hard stop per configuration; derived from the sampling window when unset.
    pub wall_clock_ceiling_secs: Option<f64>,
    /// Frames kept with their image for the spatial analysis.
    pub spatial_frames: usize,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Duration,
            duration_secs: constants::DEFAULT_SAMPLE_SECS as f64,
            max_frames: 900,
            frame_timeout_ms: constants::DEFAULT_FRAME_TIMEOUT_MS,
            max_consecutive_drops: constants::DEFAULT_MAX_CONSECUTIVE_DROPS,
            wall_clock_ceiling_secs: None,
            spatial_frames: constants::DEFAULT_SPATIAL_FRAMES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    /// Include raw interval series in the JSON export.
    pub export_intervals: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            export_intervals: true,
        }
    }
}

impl BenchmarkSettings {
    /// Load from `explicit`, else the first settings file found, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// `./camjitter.toml`, then the per-user config directory.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(constants::CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(constants::APP_NAME).join(constants::CONFIG_FILE));
        }
        paths
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content).map_err(|source| SettingsError::Parse {
            path: origin.to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));
        let sampling = &self.sampling;

        if self.configurations.is_empty() {
            return invalid("no stream configurations to benchmark");
        }
        if let Some(zero) = self.configurations.iter().find(|c| c.target_fps == 0) {
            return Err(SettingsError::Invalid(format!(
                "{} requests 0 fps",
                zero.resolution
            )));
        }
        match sampling.mode {
            SamplingMode::Duration => {
                seconds(sampling.duration_secs, "sampling.duration_secs")?;
            }
            SamplingMode::Frames if sampling.max_frames == 0 => {
                return invalid("sampling.max_frames must be positive");
            }
            _ => {}
        }
        if sampling.frame_timeout_ms == 0 {
            return invalid("sampling.frame_timeout_ms must be positive");
        }
        if sampling.max_consecutive_drops == 0 {
            return invalid("sampling.max_consecutive_drops must be positive");
        }
        if let Some(ceiling) = sampling.wall_clock_ceiling_secs {
            seconds(ceiling, "sampling.wall_clock_ceiling_secs")?;
            if sampling.mode == SamplingMode::Duration && ceiling < sampling.duration_secs {
                return invalid("sampling.wall_clock_ceiling_secs is shorter than the sampling window");
            }
        }
        seconds(self.ceiling_secs(), "sampling window plus ceiling slack")?;

        let sim = &self.simulation;
        if !(0.0..=1.0).contains(&sim.stall_probability) {
            return invalid("simulation.stall_probability must be within [0, 1]");
        }
        if !(0.0..=constants::MAX_SIMULATED_JITTER_MS).contains(&sim.jitter_ms) {
            return Err(SettingsError::Invalid(format!(
                "simulation.jitter_ms must be within [0, {}]",
                constants::MAX_SIMULATED_JITTER_MS
            )));
        }
        if sim.stall_ms > constants::MAX_SIMULATED_STALL_MS {
            return Err(SettingsError::Invalid(format!(
                "simulation.stall_ms must not exceed {}",
                constants::MAX_SIMULATED_STALL_MS
            )));
        }
        Ok(())
    }

    pub fn device_address(&self) -> DeviceAddress {
        DeviceAddress::new(self.device.address.clone(), self.device.port)
    }

    fn ceiling_secs(&self) -> f64 {
        match (self.sampling.wall_clock_ceiling_secs, self.sampling.mode) {
            (Some(secs), _) => secs,
            (None, SamplingMode::Duration) => {
                self.sampling.duration_secs + constants::DEFAULT_CEILING_SLACK_SECS as f64
            }
            (None, SamplingMode::Frames) => constants::DEFAULT_COUNT_CEILING_SECS as f64,
        }
    }

    /// Saturates on values `validate` would reject.
    pub fn wall_clock_ceiling(&self) -> Duration {
        saturating_secs(self.ceiling_secs())
    }

    pub fn sampling_plan(&self) -> SamplingPlan {
        let limit = match self.sampling.mode {
            SamplingMode::Duration => {
                SampleLimit::Duration(saturating_secs(self.sampling.duration_secs))
            }
            SamplingMode::Frames => SampleLimit::Frames(self.sampling.max_frames),
        };
        SamplingPlan {
            limit,
            frame_timeout: Duration::from_millis(self.sampling.frame_timeout_ms),
            max_consecutive_drops: self.sampling.max_consecutive_drops,
            wall_clock_ceiling: self.wall_clock_ceiling(),
            retain_images: self.sampling.spatial_frames,
        }
    }
}

/// Positive, finite and representable as a `Duration`.
fn seconds(value: f64, name: &str) -> Result<Duration, SettingsError> {
    match Duration::try_from_secs_f64(value) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(SettingsError::Invalid(format!(
            "{} must be a positive number of seconds below {}",
            name,
            Duration::MAX.as_secs()
        ))),
    }
}

fn saturating_secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}
