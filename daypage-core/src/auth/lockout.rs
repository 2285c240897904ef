//! Optional backoff after repeated failed unlock attempts.
//!
//! Disabled by default: the gate then accepts any number of attempts per
//! session. When enabled, failures are counted in memory only, so a restart
//! clears them along with the session unlock flag.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default maximum failed attempts before lockout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

const DEFAULT_BASE_LOCKOUT_SECONDS: i64 = 30;

/// Upper bound for the base duration (one day)
pub const MAX_BASE_LOCKOUT_SECONDS: i64 = 24 * 60 * 60;

/// Backoff doubles at most this many times
const MAX_DOUBLINGS: u32 = 10;

/// Lockout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Whether to enable lockout
    pub enabled: bool,
    /// Maximum failed attempts before triggering lockout
    pub max_attempts: u32,
    /// Base lockout duration in seconds (exponential backoff multiplier)
    pub base_lockout_seconds: i64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_lockout_seconds: DEFAULT_BASE_LOCKOUT_SECONDS,
        }
    }
}

impl LockoutConfig {
    /// Enabled with default thresholds
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Calculate lockout duration based on number of failed attempts
    /// Uses exponential backoff: 2^(attempts - max_attempts) * base_duration
    pub fn calculate_lockout_duration(&self, failed_attempts: u32) -> Option<Duration> {
        if !self.enabled || failed_attempts < self.max_attempts {
            return None;
        }

        let excess_attempts = failed_attempts - self.max_attempts;
        let multiplier = 2_i64.pow(excess_attempts.min(MAX_DOUBLINGS));
        let base = self.base_lockout_seconds.clamp(1, MAX_BASE_LOCKOUT_SECONDS);
        let seconds = base.checked_mul(multiplier)?;

        Duration::try_seconds(seconds)
    }

    /// Bring values loaded from a config file into range
    ///
    /// A non-positive base falls back to the default; a huge one is capped.
    pub(crate) fn normalize(&mut self) {
        if self.max_attempts == 0 {
            self.max_attempts = 1;
        }
        if self.base_lockout_seconds < 1 {
            self.base_lockout_seconds = DEFAULT_BASE_LOCKOUT_SECONDS;
        }
        self.base_lockout_seconds = self.base_lockout_seconds.min(MAX_BASE_LOCKOUT_SECONDS);
    }
}

/// Session-scoped failure counter
#[derive(Debug, Clone, Default)]
pub struct AttemptTracker {
    config: LockoutConfig,
    failed_attempts: u32,
    last_failure_millis: Option<i64>,
}

impl AttemptTracker {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            failed_attempts: 0,
            last_failure_millis: None,
        }
    }

    /// Record a failed unlock attempt at `now_millis`
    pub fn record_failure(&mut self, now_millis: i64) {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.last_failure_millis = Some(now_millis);
    }

    /// Clear all failures (e.g., after successful unlock)
    pub fn clear(&mut self) {
        self.failed_attempts = 0;
        self.last_failure_millis = None;
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Milliseconds left before another attempt is allowed
    pub fn remaining_lockout_millis(&self, now_millis: i64) -> Option<i64> {
        let duration = self
            .config
            .calculate_lockout_duration(self.failed_attempts)?;
        let last_failure = self.last_failure_millis?;

        let remaining = last_failure
            .saturating_add(duration.num_milliseconds())
            .saturating_sub(now_millis);
        if remaining > 0 {
            Some(remaining)
        } else {
            None
        }
    }

    pub fn is_locked_out(&self, now_millis: i64) -> bool {
        self.remaining_lockout_millis(now_millis).is_some()
    }
}
