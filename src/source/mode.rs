use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SettingsError;

/// Camera resolutions exposed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "QVGA", alias = "qvga")]
    Qvga,
    #[serde(rename = "VGA", alias = "vga")]
    Vga,
}

impl Resolution {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Qvga => (320, 240),
            Resolution::Vga => (640, 480),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resolution::Qvga => "QVGA",
            Resolution::Vga => "VGA",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QVGA" => Ok(Resolution::Qvga),
            "VGA" => Ok(Resolution::Vga),
            _ => Err(SettingsError::UnknownConfiguration(s.to_string())),
        }
    }
}

/// One benchmark mode: a resolution at a requested frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamConfig {
    pub resolution: Resolution,
    pub target_fps: u32,
}

impl StreamConfig {
    pub const fn new(resolution: Resolution, target_fps: u32) -> Self {
        Self { resolution, target_fps }
    }

    /// Label used in reports, e.g. `VGA_15fps`.
    pub fn label(&self) -> String {
        format!("{}_{}fps", self.resolution, self.target_fps)
    }

    /// The matrix the benchmark runs when nothing else is configured.
    pub fn default_matrix() -> Vec<StreamConfig> {
        vec![
            StreamConfig::new(Resolution::Vga, 15),
            StreamConfig::new(Resolution::Vga, 30),
            StreamConfig::new(Resolution::Qvga, 15),
            StreamConfig::new(Resolution::Qvga, 30),
        ]
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}fps", self.resolution, self.target_fps)
    }
}

impl FromStr for StreamConfig {
    type Err = SettingsError;

    /// Accepts labels like `VGA_15fps` or `qvga_30`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || SettingsError::UnknownConfiguration(s.to_string());
        let (res, fps) = s.trim().split_once('_').ok_or_else(unknown)?;
        let resolution = res.parse::<Resolution>().map_err(|_| unknown())?;
        let fps = fps.trim();
        let fps = fps
            .strip_suffix("fps")
            .or_else(|| fps.strip_suffix("FPS"))
            .unwrap_or(fps);
        let target_fps = fps.parse::<u32>().map_err(|_| unknown())?;
        if target_fps == 0 {
            return Err(unknown());
        }
        Ok(StreamConfig::new(resolution, target_fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parses_back() {
        for config in StreamConfig::default_matrix() {
            let parsed: StreamConfig = config.label().parse().unwrap();
            assert_eq!(parsed, config);
        }
    }

    #[test]
    fn parse_is_lenient_about_case_and_suffix() {
        let config: StreamConfig = "qvga_30".parse().unwrap();
        assert_eq!(config, StreamConfig::new(Resolution::Qvga, 30));
        assert!("HD_30fps".parse::<StreamConfig>().is_err());
        assert!("VGA_0fps".parse::<StreamConfig>().is_err());
        assert!("VGA".parse::<StreamConfig>().is_err());
    }

    #[test]
    fn default_matrix_order() {
        let labels: Vec<String> = StreamConfig::default_matrix()
            .iter()
            .map(StreamConfig::label)
            .collect();
        assert_eq!(labels, ["VGA_15fps", "VGA_30fps", "QVGA_15fps", "QVGA_30fps"]);
    }

    #[test]
    fn dimensions() {
        assert_eq!(Resolution::Vga.dimensions(), (640, 480));
        assert_eq!(Resolution::Qvga.dimensions(), (320, 240));
    }
}
