mod outcome;
mod plan;

pub use outcome::RetryOutcome;
pub use plan::{JitterStrategy, RetryPlan};
