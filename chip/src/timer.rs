use std::time::{Duration, Instant};

/// Represents a timer inside of the chip
/// infrastructure, it will count down to
/// zero from what ever number was given,
/// one step per tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Will set the value from which the timer shall count down from.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    /// Will get the value that the counter is currently at.
    pub fn get_value(&self) -> u8 {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.value > 0
    }

    /// Counts down by one, never below zero. Returns if the timer just ran out.
    pub fn tick(&mut self) -> bool {
        if self.value == 0 {
            return false;
        }
        self.value -= 1;
        self.value == 0
    }
}

/// Hands out the cycles of a fixed frequency that came due since it
/// was last asked. Time is passed in so that the pacing can be driven
/// by any clock.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
    last: Instant,
}

impl Pacer {
    /// Frequencies above a gigahertz run at one cycle per nanosecond.
    ///
    /// # Panics
    /// If `hertz` is zero.
    pub fn new(hertz: u32, start: Instant) -> Self {
        assert!(hertz > 0, "A pacer needs a frequency above zero.");
        Self {
            interval: (Duration::from_secs(1) / hertz).max(Duration::from_nanos(1)),
            last: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns how many cycles came due up until `now`, and consumes them.
    /// A clock moving backwards yields no cycles.
    pub fn due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let cycles = (elapsed.as_nanos() / self.interval.as_nanos()) as u32;
        self.last += self.interval * cycles;
        cycles
    }

    /// Forgets all pending cycles, the next one is due one interval after `now`.
    pub fn resync(&mut self, now: Instant) {
        self.last = now;
    }
}
