use std::time::Duration;

/// Exponentially stretching delays between title reassertions.
///
/// Yields `initial`, `initial * factor`, `initial * factor^2`, ... and stops
/// once the next delay would exceed `ceiling`. With the defaults (100 ms,
/// 1.5, 15 min) that is 23 delays, front-loaded toward the first seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffSchedule {
    next: Option<Duration>,
    stretch_factor: f64,
    ceiling: Duration,
}

impl BackoffSchedule {
    pub const INITIAL_DELAY: Duration = Duration::from_millis(100);
    pub const STRETCH_FACTOR: f64 = 1.5;
    pub const CEILING: Duration = Duration::from_millis(900_000);

    pub fn new(initial_delay: Duration, stretch_factor: f64, ceiling: Duration) -> Self {
        Self {
            next: Some(initial_delay),
            stretch_factor,
            ceiling,
        }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Number of injections a full run performs: the immediate one plus one per delay.
    pub fn total_reassertions(&self) -> usize {
        1 + self.clone().count()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::new(Self::INITIAL_DELAY, Self::STRETCH_FACTOR, Self::CEILING)
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.next.filter(|d| *d <= self.ceiling)?;
        // A factor that fails to grow the delay would never reach the ceiling.
        let grown = (delay.as_nanos() as f64 * self.stretch_factor).round();
        self.next = (grown.is_finite() && grown < u64::MAX as f64)
            .then(|| Duration::from_nanos(grown as u64))
            .filter(|grown| *grown > delay);
        Some(delay)
    }
}
