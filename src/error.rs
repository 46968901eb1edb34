//! Error types for configuring and executing a retry engine.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// A type-erased failure produced by an operation.
///
/// Concrete error types keep their runtime type when boxed, so handler
/// categories can downcast them during resolution.
pub type BoxError = Box<DynError>;

/// A borrowed view of a failure, as handed to categories and hooks.
pub type DynError = dyn StdError + Send + Sync + 'static;

/// Error returned when an engine or plan is configured with invalid values.
///
/// Configuration errors are raised before anything runs; the operation is
/// never invoked for a plan that failed validation.
///
/// # Examples
///
/// ```rust
/// use failover::{ConfigError, RetryEngine};
///
/// let result = RetryEngine::configure_execution(|| Ok::<_, std::io::Error>(1), 0);
/// assert_eq!(result.err(), Some(ConfigError::ZeroAttempts));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The attempt budget was zero. At least one attempt is required.
    ZeroAttempts,
    /// A plan builder was finished without an operation to run.
    MissingOperation,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "attempt budget must be at least 1"),
            Self::MissingOperation => write!(f, "no operation was supplied to execute"),
        }
    }
}

impl StdError for ConfigError {}

/// Fatal error returned when every attempt failed and no registered handler
/// accepts the final failure.
///
/// The original failure is kept as the error's [`source`](StdError::source).
///
/// # Examples
///
/// ```rust
/// use failover::RetryEngine;
/// use std::error::Error;
/// use std::io;
///
/// let engine = RetryEngine::<(), ()>::configure_execution(
///     || Err(io::Error::new(io::ErrorKind::NotFound, "missing")),
///     2,
/// )
/// .unwrap();
///
/// let unhandled = engine.execute().unwrap_err();
/// assert_eq!(unhandled.attempts(), 2);
/// assert!(unhandled.cause().is::<io::Error>());
/// assert!(unhandled.source().is_some());
/// ```
#[derive(Debug)]
pub struct UnhandledFailure {
    cause: BoxError,
    attempts: u32,
    total_duration: Duration,
}

impl UnhandledFailure {
    /// The fixed message shown for every unhandled failure.
    pub const MESSAGE: &'static str = "no handler was found for the failure that was returned; \
         register a handler for this failure category with `on_failure`";

    pub(crate) fn new(cause: BoxError, attempts: u32, total_duration: Duration) -> Self {
        Self {
            cause,
            attempts,
            total_duration,
        }
    }

    /// The failure from the final attempt.
    pub fn cause(&self) -> &DynError {
        self.cause.as_ref()
    }

    /// Extract the original failure, discarding metadata.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Total number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Total time spent across all attempts and pauses.
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }
}

impl fmt::Display for UnhandledFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl StdError for UnhandledFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroAttempts.to_string(),
            "attempt budget must be at least 1"
        );
        assert!(ConfigError::MissingOperation
            .to_string()
            .contains("no operation"));
    }

    #[test]
    fn test_unhandled_failure_message_is_fixed() {
        let err = UnhandledFailure::new("boom".into(), 3, Duration::from_millis(5));
        assert_eq!(err.to_string(), UnhandledFailure::MESSAGE);
        assert!(err.to_string().contains("on_failure"));
    }

    #[test]
    fn test_unhandled_failure_source_is_cause() {
        let cause = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = UnhandledFailure::new(Box::new(cause), 1, Duration::ZERO);

        let source = err.source().expect("source should be present");
        assert_eq!(source.to_string(), "denied");
        assert!(source.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_unhandled_failure_metadata() {
        let err = UnhandledFailure::new("boom".into(), 4, Duration::from_secs(1));
        assert_eq!(err.attempts(), 4);
        assert_eq!(err.total_duration(), Duration::from_secs(1));
        assert_eq!(err.into_cause().to_string(), "boom");
    }
}
