use std::time::Duration;

/// Tunables for the review pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPolicy {
    /// Highest round number an application may reach.
    pub max_rounds: u8,
    /// How many times a mutation is re-applied after losing a version race.
    pub write_attempts: u8,
    pub scheduler_timeout: Duration,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            write_attempts: 3,
            scheduler_timeout: Duration::from_secs(5),
        }
    }
}
