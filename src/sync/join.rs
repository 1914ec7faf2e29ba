use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Join `handle` if the thread finishes within `timeout`.
///
/// Returns `None` when the thread panicked or is still running at the
/// deadline. A thread still running is detached and left to exit on its own.
pub fn join_within<T>(handle: JoinHandle<T>, timeout: Duration) -> Option<T> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
    handle.join().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_thread_hands_back_its_value() {
        let handle = thread::spawn(|| 42);
        assert_eq!(join_within(handle, Duration::from_secs(2)), Some(42));
    }

    #[test]
    fn blocked_thread_is_detached_at_the_deadline() {
        let handle = thread::spawn(|| {
            thread::sleep(Duration::from_millis(500));
            7
        });
        let started = Instant::now();
        assert_eq!(join_within(handle, Duration::from_millis(20)), None);
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn panicked_thread_yields_none() {
        let handle = thread::spawn(|| -> u8 { panic!("reader failed") });
        assert_eq!(join_within(handle, Duration::from_secs(2)), None);
    }
}
