use crossbeam_channel::{Receiver, RecvTimeoutError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{Connector, DeviceAddress, Frame, FrameSource, StreamConfig};
use crate::error::SourceError;
use crate::shared::constants::THREAD_JOIN_TIMEOUT_MS;
use crate::sync::join_within;
use crate::utils::logger;

/// Behaviour of the synthetic camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProfile {
    /// Uniform jitter applied to each frame's due time, in ms.
    pub jitter_ms: f64,
    /// Chance per frame that the sensor stalls before delivering.
    pub stall_probability: f64,
    pub stall_ms: u64,
    /// Per-pixel noise amplitude in grey levels.
    pub noise: u8,
    pub seed: u64,
    /// Modes the simulated device refuses.
    pub rejected: Vec<StreamConfig>,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            jitter_ms: 2.0,
            stall_probability: 0.0,
            stall_ms: 1500,
            noise: 4,
            seed: 0x5eed,
            rejected: Vec::new(),
        }
    }
}

pub struct SimulatedConnector {
    profile: SimulationProfile,
}

impl SimulatedConnector {
    pub fn new(profile: SimulationProfile) -> Self {
        Self { profile }
    }
}

impl Connector for SimulatedConnector {
    fn connect(&self, address: &DeviceAddress) -> Result<Box<dyn FrameSource>, SourceError> {
        Ok(Box::new(SimulatedCamera {
            profile: self.profile.clone(),
            address: address.to_string(),
            stream: None,
            streams_started: 0,
        }))
    }
}

/// Camera whose sensor thread paces frames on its own clock, like a real device.
pub struct SimulatedCamera {
    profile: SimulationProfile,
    address: String,
    stream: Option<SensorStream>,
    streams_started: u64,
}

struct SensorStream {
    stop: Arc<AtomicBool>,
    frames: Option<Receiver<Frame>>,
    handle: Option<JoinHandle<()>>,
}

impl SensorStream {
    fn spawn(config: StreamConfig, profile: SimulationProfile, seed: u64) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let (width, height) = config.resolution.dimensions();
            let nominal = Duration::from_secs_f64(1.0 / config.target_fps.max(1) as f64);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut next_due = Instant::now() + nominal;
            let mut frame_index: u64 = 0;

            while !stop_flag.load(Ordering::Relaxed) {
                let now = Instant::now();
                // far behind schedule: resync instead of bursting
                if now > next_due + nominal * 3 {
                    next_due = now + nominal;
                }

                let due = if profile.jitter_ms > 0.0 {
                    let offset = rng.random_range(-profile.jitter_ms..=profile.jitter_ms);
                    shift(next_due, offset)
                } else {
                    next_due
                };
                sleep_until(due, &stop_flag);

                if profile.stall_probability > 0.0 && rng.random_bool(profile.stall_probability) {
                    sleep_until(Instant::now() + Duration::from_millis(profile.stall_ms), &stop_flag);
                }
                if stop_flag.load(Ordering::Relaxed) {
                    break;
                }

                let frame = render_frame(width, height, profile.noise, &mut rng);
                if sender.send(frame).is_err() {
                    break;
                }
                frame_index += 1;
                next_due += nominal;
            }
            logger::debug(&format!(
                "simulated sensor {} stopped after {} frames",
                config.label(),
                frame_index
            ));
        });

        Self {
            stop,
            frames: Some(receiver),
            handle: Some(handle),
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // unblocks a pending send
        self.frames.take();
        if let Some(handle) = self.handle.take() {
            let timeout = Duration::from_millis(THREAD_JOIN_TIMEOUT_MS);
            if join_within(handle, timeout).is_none() {
                logger::warn("simulated sensor thread did not stop in time, detaching it");
            }
        }
    }
}

impl Drop for SensorStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn shift(instant: Instant, offset_ms: f64) -> Instant {
    let delta = Duration::from_secs_f64(offset_ms.abs() / 1000.0);
    if offset_ms >= 0.0 {
        instant + delta
    } else {
        instant.checked_sub(delta).unwrap_or(instant)
    }
}

/// Sleep in short slices so a stop request is honoured promptly.
fn sleep_until(deadline: Instant, stop: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(20);
    loop {
        let now = Instant::now();
        if now >= deadline || stop.load(Ordering::Relaxed) {
            return;
        }
        thread::sleep((deadline - now).min(SLICE));
    }
}

/// Static RGB gradient with per-pixel noise.
fn render_frame(width: u32, height: u32, noise: u8, rng: &mut StdRng) -> Frame {
    let mut buffer = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let base = [
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128u8,
            ];
            for channel in base {
                let value = if noise > 0 {
                    let n = rng.random_range(-(noise as i16)..=(noise as i16));
                    (channel as i16 + n).clamp(0, 255) as u8
                } else {
                    channel
                };
                buffer.push(value);
            }
        }
    }
    Frame::rgb(buffer, width, height)
}

impl FrameSource for SimulatedCamera {
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), SourceError> {
        if self.profile.rejected.contains(config) {
            return Err(SourceError::UnsupportedConfig {
                mode: config.label(),
                reason: "mode not offered by simulated device".into(),
            });
        }
        self.release_stream();
        self.streams_started += 1;
        let seed = self.profile.seed.wrapping_add(self.streams_started);
        self.stream = Some(SensorStream::spawn(*config, self.profile.clone(), seed));
        logger::debug(&format!("simulated stream started: {}", config.label()));
        Ok(())
    }

    fn get_frame(&mut self, timeout: Duration) -> Result<Frame, SourceError> {
        let receiver = self
            .stream
            .as_ref()
            .and_then(|stream| stream.frames.as_ref())
            .ok_or_else(|| SourceError::Stream("no stream configured".into()))?;

        match receiver.recv_timeout(timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(SourceError::FrameTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SourceError::Stream("sensor thread stopped".into()))
            }
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown();
        }
    }

    fn disconnect(&mut self) {
        self.release_stream();
    }

    fn describe(&self) -> String {
        format!("simulated camera @ {}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Resolution;

    fn camera(profile: SimulationProfile) -> Box<dyn FrameSource> {
        SimulatedConnector::new(profile)
            .connect(&DeviceAddress::new("sim", 0))
            .unwrap()
    }

    #[test]
    fn delivers_frames_at_configured_resolution() {
        let mut cam = camera(SimulationProfile::default());
        cam.configure_stream(&StreamConfig::new(Resolution::Qvga, 30)).unwrap();
        let frame = cam.get_frame(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.dimensions(), (320, 240));
        assert_eq!(frame.channels, 3);
        assert!(frame.is_well_formed());
        cam.disconnect();
    }

    #[test]
    fn rejected_mode_is_unsupported() {
        let qvga30 = StreamConfig::new(Resolution::Qvga, 30);
        let mut cam = camera(SimulationProfile {
            rejected: vec![qvga30],
            ..SimulationProfile::default()
        });
        let err = cam.configure_stream(&qvga30).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedConfig { .. }));
    }

    #[test]
    fn unconfigured_stream_is_an_error() {
        let mut cam = camera(SimulationProfile::default());
        assert!(matches!(
            cam.get_frame(Duration::from_millis(10)),
            Err(SourceError::Stream(_))
        ));
    }

    #[test]
    fn stalled_sensor_times_out() {
        let mut cam = camera(SimulationProfile {
            stall_probability: 1.0,
            stall_ms: 500,
            ..SimulationProfile::default()
        });
        cam.configure_stream(&StreamConfig::new(Resolution::Qvga, 30)).unwrap();
        let err = cam.get_frame(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, SourceError::FrameTimeout(_)));
        cam.release_stream();
    }

    #[test]
    fn release_during_long_stall_returns_promptly() {
        let mut cam = camera(SimulationProfile {
            stall_probability: 1.0,
            stall_ms: 60_000,
            ..SimulationProfile::default()
        });
        cam.configure_stream(&StreamConfig::new(Resolution::Qvga, 30)).unwrap();
        assert!(cam.get_frame(Duration::from_millis(100)).is_err());

        let started = Instant::now();
        cam.release_stream();
        assert!(started.elapsed() < Duration::from_millis(THREAD_JOIN_TIMEOUT_MS));
        cam.configure_stream(&StreamConfig::new(Resolution::Qvga, 15)).unwrap();
        cam.disconnect();
    }

    #[test]
    fn noiseless_frames_are_identical() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = render_frame(8, 4, 0, &mut rng);
        let b = render_frame(8, 4, 0, &mut rng);
        assert_eq!(a, b);
    }
}
