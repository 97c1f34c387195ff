//! Time management utilities

use std::time::{Duration, Instant};

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Restart the stopwatch (reset and start)
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Return the elapsed time and restart from zero
    pub fn lap(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.restart();
        elapsed
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Fixed-rate step accumulator
///
/// Elapsed wall-clock time is added to a carry-over accumulator; every whole
/// interval in it is one due step. The fractional remainder is kept for the
/// next call so the step count does not drift. At most `max_steps` are
/// released per call and any backlog beyond that is discarded.
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    accumulator: Duration,
    max_steps: u32,
    dropped: u64,
}

impl FixedStep {
    /// Create an accumulator for `steps_per_second` steps, releasing at most
    /// `max_steps` steps per [`advance`](Self::advance)
    pub fn new(steps_per_second: u32, max_steps: u32) -> Self {
        Self {
            interval: Duration::from_nanos(1_000_000_000 / u64::from(steps_per_second.max(1))),
            accumulator: Duration::ZERO,
            max_steps: max_steps.max(1),
            dropped: 0,
        }
    }

    /// Length of one step
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Length of one step in seconds
    pub fn interval_secs(&self) -> f64 {
        self.interval.as_secs_f64()
    }

    /// Time carried over towards the next step
    pub fn remainder(&self) -> Duration {
        self.accumulator
    }

    /// Steps discarded so far because the backlog exceeded the cap
    pub fn dropped_steps(&self) -> u64 {
        self.dropped
    }

    /// Add elapsed time and return how many steps are due now
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut due = 0;
        while self.accumulator >= self.interval && due < self.max_steps {
            self.accumulator -= self.interval;
            due += 1;
        }

        if self.accumulator >= self.interval {
            let backlog = self.accumulator.as_nanos() / self.interval.as_nanos().max(1);
            self.dropped += u64::try_from(backlog).unwrap_or(u64::MAX);
            log::warn!("Tick loop fell behind, dropping {backlog} tick(s)");
            self.accumulator = Duration::from_nanos(
                u64::try_from(self.accumulator.as_nanos() % self.interval.as_nanos().max(1)).unwrap_or(0),
            );
        }

        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_lap_restarts() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        std::thread::sleep(Duration::from_millis(2));

        let lap = stopwatch.lap();
        assert!(lap >= Duration::from_millis(2));
        assert!(stopwatch.elapsed() < lap);
    }

    #[test]
    fn test_fixed_step_keeps_remainder() {
        let mut step = FixedStep::new(10, 5);
        assert_eq!(step.advance(Duration::from_millis(150)), 1);
        assert_eq!(step.remainder(), Duration::from_millis(50));
        assert_eq!(step.advance(Duration::from_millis(50)), 1);
        assert_eq!(step.remainder(), Duration::ZERO);
    }

    #[test]
    fn test_fixed_step_count_tracks_rate() {
        // 60 ticks/s over 10 simulated seconds of uneven frames
        let mut step = FixedStep::new(60, 5);
        let frames = [3u64, 7, 16, 1, 33, 12, 5];
        let mut total = Duration::ZERO;
        let mut ticks = 0u64;
        let mut index = 0;
        while total < Duration::from_secs(10) {
            let frame = Duration::from_millis(frames[index % frames.len()]);
            total += frame;
            ticks += u64::from(step.advance(frame));
            index += 1;
        }

        let expected = total.as_secs_f64() * 60.0;
        assert!((ticks as f64 - expected).abs() <= 1.0, "ticks {ticks}, expected {expected}");
    }

    #[test]
    fn test_fixed_step_caps_and_drops_backlog() {
        let mut step = FixedStep::new(100, 3);
        assert_eq!(step.advance(Duration::from_millis(105)), 3);
        assert_eq!(step.dropped_steps(), 7);
        assert_eq!(step.remainder(), Duration::from_millis(5));
    }
}
