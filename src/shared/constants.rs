pub const APP_NAME: &str = "camjitter";

pub const CONFIG_FILE: &str = "camjitter.toml";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";

pub const DEFAULT_DEVICE_ADDRESS: &str = "172.15.1.29";
pub const DEFAULT_DEVICE_PORT: u16 = 9559;
pub const DEFAULT_STREAM_URL: &str = "rtsp://{host}:{port}/camera";
pub const DEFAULT_OUTPUT_DIR: &str = "benchmark_data";

pub const DEFAULT_SAMPLE_SECS: u64 = 30;
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_MAX_CONSECUTIVE_DROPS: u32 = 30;
/// Extra wall-clock allowance on top of the sampling window.
pub const DEFAULT_CEILING_SLACK_SECS: u64 = 30;
/// Ceiling used when sampling is count-bound and there is no window to extend.
pub const DEFAULT_COUNT_CEILING_SECS: u64 = 120;
pub const DEFAULT_SPATIAL_FRAMES: usize = 100;

pub const MAX_SIMULATED_JITTER_MS: f64 = 1_000.0;
pub const MAX_SIMULATED_STALL_MS: u64 = 3_600_000;
/// How long a stream shutdown waits for its capture thread.
pub const THREAD_JOIN_TIMEOUT_MS: u64 = 2_000;

/// Grey levels span 0..=255.
pub const MAX_GREY_LEVEL: f64 = 255.0;

pub const REPORT_JSON_PREFIX: &str = "camera_benchmark";
pub const TEMPORAL_CSV_PREFIX: &str = "temporal_data";
pub const SPATIAL_CSV_PREFIX: &str = "spatial_data";
pub const SUMMARY_PREFIX: &str = "summary";

pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

pub const RULE: &str = "==================================================";
