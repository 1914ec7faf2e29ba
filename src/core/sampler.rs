use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::source::{FrameSample, FrameSource, StreamConfig};
use crate::sync::SampleClock;
use crate::utils::logger;

/// When a sampling run stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLimit {
    Duration(Duration),
    Frames(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPlan {
    pub limit: SampleLimit,
    pub frame_timeout: Duration,
    /// More consecutive drops than this ends the run early.
    pub max_consecutive_drops: u32,
    pub wall_clock_ceiling: Duration,
    /// Number of leading frames whose image is kept.
    pub retain_images: usize,
}

/// Why a run ended before its limit.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    #[error("excessive drops: {consecutive} consecutive frames missed")]
    ExcessiveDrops { consecutive: u32 },
    #[error("wall-clock ceiling reached after {elapsed_ms:.0}ms")]
    WallClockCeiling { elapsed_ms: f64 },
    #[error("interrupted")]
    Interrupted,
}

/// Output of one sampling run.
#[derive(Debug, Clone)]
pub struct SampleRun {
    pub samples: Vec<FrameSample>,
    pub frames_dropped: usize,
    pub elapsed: Duration,
    pub termination: Option<Termination>,
}

impl SampleRun {
    pub fn frames_captured(&self) -> usize {
        self.samples.len()
    }

    pub fn is_complete(&self) -> bool {
        self.termination.is_none()
    }
}

/// Pulls frames as fast as the source delivers them, stamping each on receipt.
///
/// The sampler never paces itself: deviation from the nominal rate is the
/// quantity under measurement.
pub struct TemporalSampler<'a> {
    plan: &'a SamplingPlan,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> TemporalSampler<'a> {
    pub fn new(plan: &'a SamplingPlan) -> Self {
        Self { plan, cancel: None }
    }

    /// Stop cooperatively once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn limit_reached(&self, elapsed: Duration, captured: usize) -> bool {
        match self.plan.limit {
            SampleLimit::Duration(window) => elapsed >= window,
            SampleLimit::Frames(count) => captured >= count,
        }
    }

    pub fn sample(&self, source: &mut dyn FrameSource, config: &StreamConfig) -> SampleRun {
        let plan = self.plan;
        let mut clock = SampleClock::start();
        let mut samples: Vec<FrameSample> = Vec::new();
        let mut frames_dropped = 0usize;
        let mut consecutive_drops = 0u32;
        let mut termination = None;

        loop {
            let elapsed = clock.elapsed();
            if self.cancelled() {
                termination = Some(Termination::Interrupted);
                break;
            }
            if self.limit_reached(elapsed, samples.len()) {
                break;
            }
            if elapsed >= plan.wall_clock_ceiling {
                termination = Some(Termination::WallClockCeiling {
                    elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                });
                break;
            }

            match source.get_frame(plan.frame_timeout) {
                Ok(frame) => {
                    let timestamp = clock.stamp();
                    consecutive_drops = 0;
                    let keep = samples.len() < plan.retain_images;
                    samples.push(FrameSample::new(timestamp, keep.then_some(frame)));
                }
                Err(err) => {
                    frames_dropped += 1;
                    consecutive_drops += 1;
                    logger::debug(&format!(
                        "{}: drop #{} ({} in a row): {}",
                        config.label(),
                        frames_dropped,
                        consecutive_drops,
                        err
                    ));
                    if consecutive_drops > plan.max_consecutive_drops {
                        termination = Some(Termination::ExcessiveDrops {
                            consecutive: consecutive_drops,
                        });
                        break;
                    }
                }
            }
        }

        let elapsed = clock.elapsed();
        if let Some(reason) = &termination {
            logger::error(&format!("{}: sampling ended early: {}", config.label(), reason));
        }
        logger::info(&format!(
            "{}: sampled {} frames, {} dropped in {:.2}s",
            config.label(),
            samples.len(),
            frames_dropped,
            elapsed.as_secs_f64()
        ));

        SampleRun {
            samples,
            frames_dropped,
            elapsed,
            termination,
        }
    }
}
