// SPDX-License-Identifier: GPL-3.0-only

//! Capture cadence
//!
//! Slot `n` opens at `start + n * interval`. Every deadline is measured from
//! the single start instant, so a slow iteration shortens the following wait
//! instead of pushing every later frame back.

use crate::constants::timing;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time source for the scheduler
pub trait Clock {
    /// Time since the run started
    fn elapsed(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock anchored at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to; sleeping advances it instantly
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate work taking `duration`
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Fixed-interval pacing with bounded sleep steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    interval: Duration,
    poll: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            poll: timing::PACING_POLL_INTERVAL,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Earliest start of slot `index`, relative to the run start
    pub fn deadline(&self, index: u64) -> Duration {
        u32::try_from(index)
            .ok()
            .and_then(|n| self.interval.checked_mul(n))
            .unwrap_or(Duration::MAX)
    }

    /// Sleep until slot `index` opens
    ///
    /// Returns `false` if `stop` was raised while waiting.
    pub fn wait_for_slot(&self, clock: &impl Clock, index: u64, stop: &AtomicBool) -> bool {
        let deadline = self.deadline(index);
        loop {
            if stop.load(Ordering::SeqCst) {
                return false;
            }
            let elapsed = clock.elapsed();
            if elapsed >= deadline {
                return true;
            }
            clock.sleep(self.poll.min(deadline - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlines_are_multiples_of_interval() {
        let pacer = Pacer::new(Duration::from_secs(2));
        assert_eq!(pacer.deadline(0), Duration::ZERO);
        assert_eq!(pacer.deadline(3), Duration::from_secs(6));
        assert_eq!(pacer.deadline(u64::MAX), Duration::MAX);
    }

    #[test]
    fn test_wait_polls_in_bounded_steps() {
        let clock = ManualClock::new();
        let pacer = Pacer::new(Duration::from_millis(350));
        let stop = AtomicBool::new(false);

        assert!(pacer.wait_for_slot(&clock, 1, &stop));
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(50),
            ]
        );
        assert_eq!(clock.elapsed(), Duration::from_millis(350));
    }

    #[test]
    fn test_no_drift_with_slow_iterations() {
        let clock = ManualClock::new();
        let pacer = Pacer::new(Duration::from_secs(2));
        let stop = AtomicBool::new(false);
        let mut starts = Vec::new();

        for index in 0..5u64 {
            assert!(pacer.wait_for_slot(&clock, index, &stop));
            starts.push(clock.elapsed());
            clock.advance(Duration::from_millis(300));
        }

        for (n, start) in starts.iter().enumerate() {
            assert_eq!(*start, Duration::from_secs(2 * n as u64));
        }
    }

    #[test]
    fn test_overrun_does_not_wait() {
        let clock = ManualClock::new();
        let pacer = Pacer::new(Duration::from_secs(1));
        let stop = AtomicBool::new(false);

        clock.advance(Duration::from_millis(2500));
        assert!(pacer.wait_for_slot(&clock, 2, &stop));
        assert!(clock.sleeps().is_empty());

        // The next slot is still anchored at 3s
        assert!(pacer.wait_for_slot(&clock, 3, &stop));
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_stop_interrupts_wait() {
        let clock = ManualClock::new();
        let pacer = Pacer::new(Duration::from_secs(60));
        let stop = AtomicBool::new(true);

        assert!(!pacer.wait_for_slot(&clock, 1, &stop));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
