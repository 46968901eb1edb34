//! The value handed back by one execution.

use std::fmt;
use std::time::Duration;

use crate::error::{BoxError, DynError};

/// The outcome of one execution: a success value, or a fallback value plus
/// the failure that caused it.
///
/// The shape is the same whichever way the execution ended; the slots that
/// do not apply are `None`. A `RetryResult` is built once, at the end of an
/// execution, and cannot be changed afterwards.
///
/// # Examples
///
/// ```rust
/// use failover::RetryEngine;
///
/// let result = RetryEngine::configure_execution(|| Ok::<_, std::io::Error>("Hello World"), 5)
///     .unwrap()
///     .execute()
///     .unwrap();
///
/// assert!(!result.failed());
/// assert_eq!(result.success_value(), Some(&"Hello World"));
/// assert!(result.failure_value().is_none());
/// assert_eq!(result.attempts(), 1);
/// ```
pub struct RetryResult<S, F> {
    success: Option<S>,
    failure: Option<F>,
    cause: Option<BoxError>,
    attempts: u32,
    elapsed: Duration,
}

impl<S, F> RetryResult<S, F> {
    pub(crate) fn succeeded(value: S, attempts: u32, elapsed: Duration) -> Self {
        Self {
            success: Some(value),
            failure: None,
            cause: None,
            attempts,
            elapsed,
        }
    }

    pub(crate) fn fell_back(value: F, cause: BoxError, attempts: u32, elapsed: Duration) -> Self {
        Self {
            success: None,
            failure: Some(value),
            cause: Some(cause),
            attempts,
            elapsed,
        }
    }

    /// The operation's value, if it ultimately succeeded.
    pub fn success_value(&self) -> Option<&S> {
        self.success.as_ref()
    }

    /// The handler's fallback value, if every attempt failed.
    pub fn failure_value(&self) -> Option<&F> {
        self.failure.as_ref()
    }

    /// The failure from the final attempt, if the operation never succeeded.
    pub fn failure_cause(&self) -> Option<&DynError> {
        self.cause.as_deref()
    }

    /// Returns true if the operation never succeeded and a handler ran.
    pub fn failed(&self) -> bool {
        self.cause.is_some()
    }

    /// Number of attempts made, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time spent across all attempts and pauses.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Take the success value, discarding everything else.
    pub fn into_success(self) -> Option<S> {
        self.success
    }

    /// Take the fallback value, discarding everything else.
    pub fn into_failure(self) -> Option<F> {
        self.failure
    }

    /// Take the failure cause, discarding everything else.
    pub fn into_cause(self) -> Option<BoxError> {
        self.cause
    }

    /// Collapse into a standard `Result`: `Ok` with the success value, or
    /// `Err` with the fallback value.
    ///
    /// Returns `None` only for a result holding neither value, which the
    /// engine never produces.
    pub fn into_result(self) -> Option<Result<S, F>> {
        match (self.success, self.failure) {
            (Some(value), _) => Some(Ok(value)),
            (None, Some(fallback)) => Some(Err(fallback)),
            (None, None) => None,
        }
    }
}

impl<S: fmt::Debug, F: fmt::Debug> fmt::Debug for RetryResult<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryResult")
            .field("success", &self.success)
            .field("failure", &self.failure)
            .field("cause", &self.cause.as_ref().map(ToString::to_string))
            .field("attempts", &self.attempts)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod outcome_tests {
    use super::*;

    #[test]
    fn test_succeeded_shape() {
        let result: RetryResult<i32, String> =
            RetryResult::succeeded(42, 2, Duration::from_millis(3));

        assert!(!result.failed());
        assert_eq!(result.success_value(), Some(&42));
        assert!(result.failure_value().is_none());
        assert!(result.failure_cause().is_none());
        assert_eq!(result.attempts(), 2);
        assert_eq!(result.elapsed(), Duration::from_millis(3));
    }

    #[test]
    fn test_fell_back_shape() {
        let result: RetryResult<i32, String> =
            RetryResult::fell_back("fallback".to_string(), "boom".into(), 3, Duration::ZERO);

        assert!(result.failed());
        assert!(result.success_value().is_none());
        assert_eq!(result.failure_value().map(String::as_str), Some("fallback"));
        assert_eq!(result.failure_cause().unwrap().to_string(), "boom");
    }

    #[test]
    fn test_into_result() {
        let ok: RetryResult<i32, &str> = RetryResult::succeeded(1, 1, Duration::ZERO);
        assert_eq!(ok.into_result(), Some(Ok(1)));

        let err: RetryResult<i32, &str> =
            RetryResult::fell_back("fallback", "boom".into(), 1, Duration::ZERO);
        assert_eq!(err.into_result(), Some(Err("fallback")));
    }

    #[test]
    fn test_consuming_accessors() {
        let result: RetryResult<i32, &str> =
            RetryResult::fell_back("fallback", "boom".into(), 1, Duration::ZERO);
        assert_eq!(result.into_cause().unwrap().to_string(), "boom");

        let result: RetryResult<i32, &str> = RetryResult::succeeded(9, 1, Duration::ZERO);
        assert_eq!(result.into_success(), Some(9));
    }

    #[test]
    fn test_debug_renders_cause_message() {
        let result: RetryResult<i32, &str> =
            RetryResult::fell_back("fallback", "disk on fire".into(), 1, Duration::ZERO);
        let debug = format!("{:?}", result);
        assert!(debug.contains("RetryResult"));
        assert!(debug.contains("disk on fire"));
    }
}
