//! Retry settings as plain data.
//!
//! [`RetrySettings`] describes how many times to try an operation and how long
//! to pause between tries. It holds no operation, so it can be built once,
//! stored in application configuration, and applied to many plans.
//!
//! With the `serde` feature enabled, settings can be read from any serde
//! format. The delay is expressed in milliseconds as `delay_ms`:
//!
//! ```rust,ignore
//! use failover::RetrySettings;
//!
//! let settings: RetrySettings = serde_json::from_str(r#"{"attempts": 3, "delay_ms": 250}"#)?;
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// How many attempts to make and how long to pause between them.
///
/// # Examples
///
/// ```rust
/// use failover::RetrySettings;
/// use std::time::Duration;
///
/// let settings = RetrySettings::default()
///     .with_attempts(3)
///     .with_delay(Duration::from_millis(100));
///
/// assert_eq!(settings.attempts(), 3);
/// assert_eq!(settings.delay(), Duration::from_millis(100));
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetrySettings {
    attempts: u32,
    #[cfg_attr(feature = "serde", serde(rename = "delay_ms", with = "millis"))]
    delay: Duration,
}

impl RetrySettings {
    /// Attempt budget used when none is configured.
    pub const DEFAULT_ATTEMPTS: u32 = 1;

    /// Create settings with the given attempt budget and no delay.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            delay: Duration::ZERO,
        }
    }

    /// Set the total number of attempts, including the first.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the pause between a failed attempt and the next one.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the attempt budget.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Get the delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Check that the settings describe a runnable plan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 {
            Err(ConfigError::ZeroAttempts)
        } else {
            Ok(())
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
