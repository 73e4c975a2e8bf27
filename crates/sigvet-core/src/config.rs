//! Engine configuration.

use std::time::Duration;

/// Environment variable holding the per-call collaborator timeout in seconds.
pub const COLLABORATOR_TIMEOUT_ENV: &str = "SIGVET_COLLABORATOR_TIMEOUT_SECS";

/// Validator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Upper bound for each collaborator call. `None` waits indefinitely.
    pub collaborator_timeout: Option<Duration>,
}

impl ValidatorConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SIGVET_COLLABORATOR_TIMEOUT_SECS` | Per-call timeout; unset or `0` disables it |
    pub fn from_env() -> Self {
        Self {
            collaborator_timeout: std::env::var(COLLABORATOR_TIMEOUT_ENV)
                .ok()
                .and_then(|v| parse_timeout_secs(&v)),
        }
    }

    /// Set the collaborator timeout.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = Some(timeout);
        self
    }
}

fn parse_timeout_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}
