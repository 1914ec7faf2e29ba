use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failures at the device boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("cannot reach device at {address}: {reason}")]
    Connection { address: String, reason: String },
    #[error("device rejected stream mode {mode}: {reason}")]
    UnsupportedConfig { mode: String, reason: String },
    #[error("no frame delivered within {0:?}")]
    FrameTimeout(Duration),
    #[error("stream error: {0}")]
    Stream(String),
}

/// Why a metric could not be computed. Stored on metric records, never raised.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("insufficient data: need {required} frames, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("mean frame interval is zero, frame rate undefined")]
    ZeroMeanInterval,
    #[error("timestamps not strictly increasing at frame {index}")]
    NonMonotonicTimestamps { index: usize },
    #[error("no comparable frame pairs ({excluded} excluded)")]
    NoComparablePairs { excluded: usize },
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("unknown stream configuration '{0}' (expected e.g. VGA_15fps)")]
    UnknownConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_name_the_device_and_mode() {
        let conn = SourceError::Connection {
            address: "10.0.0.1:9559".into(),
            reason: "refused".into(),
        };
        assert_eq!(conn.to_string(), "cannot reach device at 10.0.0.1:9559: refused");
        let rejected = SourceError::UnsupportedConfig {
            mode: "QVGA_30fps".into(),
            reason: "busy".into(),
        };
        assert!(rejected.to_string().contains("QVGA_30fps"));
        assert!(SourceError::FrameTimeout(Duration::from_millis(5))
            .to_string()
            .contains("5ms"));
    }

    #[test]
    fn analysis_error_serializes_with_kind_tag() {
        let err = AnalysisError::InsufficientData {
            required: 2,
            available: 1,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"kind\":\"insufficient_data\""));
        let back: AnalysisError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
