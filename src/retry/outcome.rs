use std::time::Duration;

use tracing::Level;
use tracing::event;

/// Summary of one completed refresh, logged once whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub attempts: u8,
    pub success: bool,
    pub elapsed: Duration,
}

impl RetryOutcome {
    pub fn log(&self) {
        event!(
            Level::INFO,
            attempts = self.attempts,
            success = self.success,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "refresh.outcome"
        );
    }
}
