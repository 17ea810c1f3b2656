use std::time::Duration;

/// Timing of job-status polls: first delay, growth factor, ceiling and an
/// optional cap on the number of status checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub backoff: f64,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            backoff: 1.5,
            max_interval: Duration::from_secs(30),
            max_attempts: Some(240),
        }
    }
}

impl PollSchedule {
    /// Constant interval, no attempt cap.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: 1.0,
            max_interval: interval,
            max_attempts: None,
        }
    }

    /// Delay before status check number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let ceiling = self.max_interval.max(self.interval);
        let scaled = self.interval.as_secs_f64() * factor;
        if !scaled.is_finite() || scaled >= ceiling.as_secs_f64() {
            ceiling
        } else {
            Duration::from_secs_f64(scaled)
        }
    }

    /// Whether `attempts` completed checks have used up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}
