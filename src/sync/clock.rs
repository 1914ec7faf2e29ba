use std::time::{Duration, Instant};

/// Monotonic clock for one sampling run.
///
/// Every call to [`SampleClock::stamp`] returns a strictly larger offset than
/// the one before it; a tie with the previous stamp is nudged forward by 1ns.
pub struct SampleClock {
    start: Instant,
    last: Option<Duration>,
}

impl SampleClock {
    /// Start a clock at time zero
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            last: None,
        }
    }

    /// Elapsed time since start, without recording a stamp
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record the receipt time of a frame.
    pub fn stamp(&mut self) -> Duration {
        let now = self.start.elapsed();
        self.stamp_at(now)
    }

    fn stamp_at(&mut self, now: Duration) -> Duration {
        let stamped = match self.last {
            Some(last) if now <= last => last + Duration::from_nanos(1),
            _ => now,
        };
        self.last = Some(stamped);
        stamped
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::start()
    }
}
