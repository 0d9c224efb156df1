//! Pluggable stopping conditions
//!
//! Objectives are evaluated against the tracker on every poll tick; the
//! session stops as soon as any registered objective reports satisfied.
//! Checks must be cheap and side-effect free.

use std::time::Duration;

use crate::tracker::Tracker;

/// A stopping condition evaluated against aggregate statistics.
pub trait Objective: Send + Sync {
    /// True when the session should stop.
    fn check(&self, tracker: &Tracker) -> bool;

    /// Short label for the shutdown log line.
    fn describe(&self) -> String;
}

/// Stop once the given number of attempts has been made.
pub struct MaxAttempts {
    limit: u64,
}

impl MaxAttempts {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Objective for MaxAttempts {
    fn check(&self, tracker: &Tracker) -> bool {
        tracker.attempts() >= self.limit
    }

    fn describe(&self) -> String {
        format!("max attempts ({})", self.limit)
    }
}

/// Stop once the session has run for the given duration.
pub struct MaxDuration {
    limit: Duration,
}

impl MaxDuration {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl Objective for MaxDuration {
    fn check(&self, tracker: &Tracker) -> bool {
        tracker.elapsed() >= self.limit
    }

    fn describe(&self) -> String {
        format!("max duration ({:?})", self.limit)
    }
}

/// Stop once the given number of accounts has completed successfully.
pub struct MaxCompleted {
    limit: u64,
}

impl MaxCompleted {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Objective for MaxCompleted {
    fn check(&self, tracker: &Tracker) -> bool {
        tracker.completed() >= self.limit
    }

    fn describe(&self) -> String {
        format!("max completed ({})", self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_attempts_fires_at_limit() {
        let tracker = Tracker::new();
        let objective = MaxAttempts::new(2);
        assert!(!objective.check(&tracker));
        tracker.inc_attempts();
        assert!(!objective.check(&tracker));
        tracker.inc_attempts();
        assert!(objective.check(&tracker));
    }

    #[test]
    fn max_duration_zero_fires_immediately() {
        let tracker = Tracker::new();
        let objective = MaxDuration::new(Duration::ZERO);
        assert!(objective.check(&tracker));
    }

    #[test]
    fn max_duration_far_future_does_not_fire() {
        let tracker = Tracker::new();
        let objective = MaxDuration::new(Duration::from_secs(3600));
        assert!(!objective.check(&tracker));
    }

    #[test]
    fn max_completed_fires_at_limit() {
        let tracker = Tracker::new();
        let objective = MaxCompleted::new(1);
        assert!(!objective.check(&tracker));
        tracker.inc_completed();
        assert!(objective.check(&tracker));
    }

    #[test]
    fn describe_names_the_limit() {
        assert_eq!(MaxAttempts::new(10).describe(), "max attempts (10)");
        assert_eq!(MaxCompleted::new(3).describe(), "max completed (3)");
    }
}
