use std::time::Duration;

use rand::Rng;

/// Strategy for adding randomness to delay calculations.
#[derive(Clone, Copy, Debug)]
pub enum JitterStrategy {
    Full,
    Decorrelated,
}

/// Attempt budget and inter-attempt backoff for one token refresh.
#[derive(Clone, Debug)]
pub struct RetryPlan {
    pub max_attempts: u8,
    pub initial_delay: Duration,
    pub multiplier: f32,
    pub max_delay: Duration,
    pub jitter: JitterStrategy,
}

impl RetryPlan {
    pub fn new(
        max_attempts: u8,
        initial_delay: Duration,
        multiplier: f32,
        max_delay: Duration,
        jitter: JitterStrategy,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier,
            max_delay,
            jitter,
        }
    }

    /// Three attempts with a short jittered backoff between transient failures.
    pub fn default_plan() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
            jitter: JitterStrategy::Full,
        }
    }

    /// Three attempts with immediate retries; mostly useful in tests.
    pub fn no_backoff() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
            jitter: JitterStrategy::Full,
        }
    }

    /// Delay to apply before `next_attempt`. The first attempt is never
    /// delayed; each retry backs off from `initial_delay`, capped and
    /// jittered.
    pub fn delay_before_attempt(&self, next_attempt: u8, rng: &mut impl Rng) -> Duration {
        if next_attempt <= 1 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = (self.multiplier.powi((next_attempt as i32) - 2)) as f64;
        let delay = self.initial_delay.mul_f64(exp).min(self.max_delay);
        let jitter = match self.jitter {
            JitterStrategy::Full => rng.gen_range(0.0..1.0),
            JitterStrategy::Decorrelated => rng.gen_range(0.5..1.5),
        };
        delay.mul_f64(jitter)
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}
