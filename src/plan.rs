//! The execution plan: what to run, how many times, and how long to pause.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BoxError, ConfigError};
use crate::settings::RetrySettings;

/// A shared, type-erased operation returning `S` or a boxed failure.
pub(crate) type Operation<S> = Arc<dyn Fn() -> Result<S, BoxError> + Send + Sync>;

/// An immutable description of one retryable operation.
///
/// A plan is pure data: building it never invokes the operation. Every
/// method that changes a setting returns a new plan and leaves the receiver
/// untouched, so a plan can be shared and reconfigured freely.
///
/// # Examples
///
/// ```rust
/// use failover::ExecutionPlan;
/// use std::time::Duration;
///
/// let plan = ExecutionPlan::new(|| Ok::<_, std::io::Error>("pong"), 3)
///     .unwrap()
///     .with_delay(Duration::from_millis(10));
///
/// let wider = plan.with_attempts(5).unwrap();
///
/// assert_eq!(plan.attempts(), 3);
/// assert_eq!(wider.attempts(), 5);
/// assert_eq!(wider.delay(), Duration::from_millis(10));
/// ```
pub struct ExecutionPlan<S> {
    operation: Operation<S>,
    attempts: u32,
    delay: Duration,
}

impl<S: 'static> ExecutionPlan<S> {
    /// Create a plan that tries `operation` up to `attempts` times with no
    /// pause between attempts.
    ///
    /// Returns [`ConfigError::ZeroAttempts`] if `attempts` is zero.
    pub fn new<Op, E>(operation: Op, attempts: u32) -> Result<Self, ConfigError>
    where
        Op: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        RetrySettings::new(attempts).validate()?;
        Ok(Self {
            operation: erase(operation),
            attempts,
            delay: Duration::ZERO,
        })
    }

    /// Start building a plan step by step.
    pub fn builder() -> ExecutionPlanBuilder<S> {
        ExecutionPlanBuilder::default()
    }

    /// Return a copy of this plan with a different pause between attempts.
    pub fn with_delay(&self, delay: Duration) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            attempts: self.attempts,
            delay,
        }
    }

    /// Return a copy of this plan with a different attempt budget.
    pub fn with_attempts(&self, attempts: u32) -> Result<Self, ConfigError> {
        RetrySettings::new(attempts).validate()?;
        Ok(Self {
            operation: Arc::clone(&self.operation),
            attempts,
            delay: self.delay,
        })
    }

    /// Return a copy of this plan running a different operation.
    pub fn with_operation<Op, E>(&self, operation: Op) -> Self
    where
        Op: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            operation: erase(operation),
            attempts: self.attempts,
            delay: self.delay,
        }
    }

    /// Total number of attempts, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between a failed attempt and the next one.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The plan's attempt budget and delay as settings.
    pub fn settings(&self) -> RetrySettings {
        RetrySettings::new(self.attempts).with_delay(self.delay)
    }

    pub(crate) fn invoke(&self) -> Result<S, BoxError> {
        (self.operation)()
    }
}

impl<S> Clone for ExecutionPlan<S> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            attempts: self.attempts,
            delay: self.delay,
        }
    }
}

impl<S> fmt::Debug for ExecutionPlan<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("operation", &"<fn>")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Step-by-step builder for an [`ExecutionPlan`].
///
/// Unset values fall back to [`RetrySettings::default`]. The operation has
/// no default: [`build`](Self::build) fails without one.
///
/// # Examples
///
/// ```rust
/// use failover::{ConfigError, ExecutionPlan};
/// use std::time::Duration;
///
/// let plan = ExecutionPlan::builder()
///     .operation(|| Ok::<_, std::io::Error>(7))
///     .attempts(4)
///     .delay(Duration::from_millis(5))
///     .build()
///     .unwrap();
/// assert_eq!(plan.attempts(), 4);
///
/// let missing = ExecutionPlan::<i32>::builder().attempts(2).build();
/// assert_eq!(missing.err(), Some(ConfigError::MissingOperation));
/// ```
pub struct ExecutionPlanBuilder<S> {
    operation: Option<Operation<S>>,
    settings: RetrySettings,
}

impl<S: 'static> ExecutionPlanBuilder<S> {
    /// Set the operation to run.
    pub fn operation<Op, E>(mut self, operation: Op) -> Self
    where
        Op: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        self.operation = Some(erase(operation));
        self
    }

    /// Set the attempt budget.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.settings = self.settings.with_attempts(attempts);
        self
    }

    /// Set the pause between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.settings = self.settings.with_delay(delay);
        self
    }

    /// Replace the attempt budget and delay with `settings`.
    pub fn settings(mut self, settings: &RetrySettings) -> Self {
        self.settings = *settings;
        self
    }

    /// Finish the plan, validating every setting.
    pub fn build(self) -> Result<ExecutionPlan<S>, ConfigError> {
        let operation = self.operation.ok_or(ConfigError::MissingOperation)?;
        self.settings.validate()?;
        Ok(ExecutionPlan {
            operation,
            attempts: self.settings.attempts(),
            delay: self.settings.delay(),
        })
    }
}

impl<S> Default for ExecutionPlanBuilder<S> {
    fn default() -> Self {
        Self {
            operation: None,
            settings: RetrySettings::default(),
        }
    }
}

impl<S> fmt::Debug for ExecutionPlanBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlanBuilder")
            .field("has_operation", &self.operation.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

fn erase<S, Op, E>(operation: Op) -> Operation<S>
where
    S: 'static,
    Op: Fn() -> Result<S, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    Arc::new(move || -> Result<S, BoxError> { operation().map_err(Into::into) })
}

#[cfg(test)]
mod plan_tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ok_plan(attempts: u32) -> Result<ExecutionPlan<&'static str>, ConfigError> {
        ExecutionPlan::new(|| Ok::<_, io::Error>("ok"), attempts)
    }

    #[test]
    fn test_new_defaults_to_zero_delay() {
        let plan = ok_plan(3).unwrap();
        assert_eq!(plan.attempts(), 3);
        assert_eq!(plan.delay(), Duration::ZERO);
    }

    #[test]
    fn test_new_rejects_zero_attempts() {
        assert_eq!(ok_plan(0).err(), Some(ConfigError::ZeroAttempts));
    }

    #[test]
    fn test_construction_does_not_invoke_operation() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let plan = ExecutionPlan::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, io::Error>(())
            },
            2,
        )
        .unwrap();
        let _ = plan.with_delay(Duration::from_millis(1));
        let _ = plan.with_attempts(4).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_methods_leave_receiver_unchanged() {
        let plan = ok_plan(2).unwrap();
        let delayed = plan.with_delay(Duration::from_millis(30));
        let wider = delayed.with_attempts(6).unwrap();

        assert_eq!(plan.delay(), Duration::ZERO);
        assert_eq!(delayed.attempts(), 2);
        assert_eq!(wider.attempts(), 6);
        assert_eq!(wider.delay(), Duration::from_millis(30));
    }

    #[test]
    fn test_with_attempts_rejects_zero() {
        let plan = ok_plan(2).unwrap();
        assert_eq!(plan.with_attempts(0).err(), Some(ConfigError::ZeroAttempts));
    }

    #[test]
    fn test_with_operation_swaps_operation_only() {
        let plan = ok_plan(3).unwrap().with_delay(Duration::from_millis(2));
        let swapped = plan.with_operation(|| Err::<&'static str, _>("nope"));

        assert_eq!(plan.invoke().unwrap(), "ok");
        assert!(swapped.invoke().is_err());
        assert_eq!(swapped.attempts(), 3);
        assert_eq!(swapped.delay(), Duration::from_millis(2));
    }

    #[test]
    fn test_operation_error_keeps_runtime_type() {
        let plan = ExecutionPlan::<()>::new(
            || Err(io::Error::new(io::ErrorKind::NotFound, "gone")),
            1,
        )
        .unwrap();
        let err = plan.invoke().unwrap_err();
        assert!(err.is::<io::Error>());
    }

    #[test]
    fn test_builder_requires_operation() {
        let result = ExecutionPlan::<u8>::builder().attempts(3).build();
        assert_eq!(result.err(), Some(ConfigError::MissingOperation));
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = ExecutionPlan::builder()
            .operation(|| Ok::<_, io::Error>(1u8))
            .attempts(0)
            .build();
        assert_eq!(result.err(), Some(ConfigError::ZeroAttempts));
    }

    #[test]
    fn test_builder_applies_settings() {
        let settings = RetrySettings::new(4).with_delay(Duration::from_millis(8));
        let plan = ExecutionPlan::builder()
            .operation(|| Ok::<_, io::Error>(1u8))
            .settings(&settings)
            .build()
            .unwrap();

        assert_eq!(plan.settings(), settings);
    }

    #[test]
    fn test_builder_defaults_to_single_attempt() {
        let plan = ExecutionPlan::builder()
            .operation(|| Ok::<_, io::Error>(1u8))
            .build()
            .unwrap();
        assert_eq!(plan.attempts(), 1);
        assert_eq!(plan.delay(), Duration::ZERO);
    }

    #[test]
    fn test_debug_hides_operation() {
        let debug = format!("{:?}", ok_plan(2).unwrap());
        assert!(debug.contains("ExecutionPlan"));
        assert!(debug.contains("<fn>"));
    }
}
