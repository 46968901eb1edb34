//! Testing utilities for code built on retry engines.
//!
//! # Scripted operations
//!
//! [`ScriptedOperation`] stands in for a flaky dependency: it fails a set
//! number of times, then succeeds, and counts every invocation.
//!
//! ```rust
//! use failover::testing::ScriptedOperation;
//! use failover::RetryEngine;
//!
//! let op = ScriptedOperation::new("reply").failing(2);
//! let engine = RetryEngine::configure_execution(op.operation(), 3).unwrap();
//!
//! assert_eq!(engine.execute().unwrap().into_success(), Some("reply"));
//! assert_eq!(op.calls(), 3);
//! ```
//!
//! # Assertion macros
//!
//! ```rust
//! use failover::{assert_fell_back, assert_succeeded, AnyFailure, RetryEngine};
//!
//! let ok = RetryEngine::configure_execution(|| Ok::<_, std::io::Error>(1), 1).unwrap();
//! assert_succeeded!(ok.execute().unwrap(), 1);
//!
//! let fallback = RetryEngine::configure_execution(|| Err::<i32, _>("down"), 1)
//!     .unwrap()
//!     .on_failure::<AnyFailure, _>(|_| -1);
//! assert_fell_back!(fallback.execute().unwrap(), -1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::BoxError;

type ErrorFactory = Arc<dyn Fn() -> BoxError + Send + Sync>;

const SCRIPTED_FAILURE: &str = "scripted failure";

/// An operation that fails a scripted number of times before succeeding.
///
/// Clones share one invocation counter, so the failures are spread across
/// every clone and every execution that uses them.
pub struct ScriptedOperation<S> {
    value: Option<S>,
    failures: u32,
    make_error: ErrorFactory,
    calls: Arc<AtomicU32>,
}

impl<S> ScriptedOperation<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Message of the failure returned when no error factory is set.
    pub const DEFAULT_ERROR: &'static str = SCRIPTED_FAILURE;

    /// An operation that succeeds with `value` on every call.
    pub fn new(value: S) -> Self {
        Self {
            value: Some(value),
            failures: 0,
            make_error: default_error(),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// An operation that never succeeds.
    pub fn always_failing() -> Self {
        Self {
            value: None,
            failures: u32::MAX,
            make_error: default_error(),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail the first `times` calls, counted across all clones.
    pub fn failing(mut self, times: u32) -> Self {
        self.failures = times;
        self
    }

    /// Produce failures with `make_error` instead of the default message.
    pub fn with_error<E, G>(mut self, make_error: G) -> Self
    where
        E: Into<BoxError> + 'static,
        G: Fn() -> E + Send + Sync + 'static,
    {
        self.make_error = Arc::new(move || -> BoxError { make_error().into() });
        self
    }

    /// Invoke the operation once.
    pub fn call(&self) -> Result<S, BoxError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err((self.make_error)());
        }
        self.value.clone().ok_or_else(|| (self.make_error)())
    }

    /// A closure suitable for `configure_execution` that shares this
    /// operation's script and counter.
    pub fn operation(&self) -> impl Fn() -> Result<S, BoxError> + Send + Sync + 'static {
        let this = self.clone();
        move || this.call()
    }

    /// How many times the operation has been invoked.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<S: Clone> Clone for ScriptedOperation<S> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            failures: self.failures,
            make_error: Arc::clone(&self.make_error),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ScriptedOperation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedOperation")
            .field("value", &self.value)
            .field("failures", &self.failures)
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

fn default_error() -> ErrorFactory {
    Arc::new(|| BoxError::from(SCRIPTED_FAILURE))
}

/// Assert that an execution succeeded, optionally with a given value.
///
/// # Example
///
/// ```rust
/// use failover::{assert_succeeded, RetryEngine};
///
/// let engine = RetryEngine::configure_execution(|| Ok::<_, std::io::Error>("up"), 2).unwrap();
/// assert_succeeded!(engine.execute().unwrap());
/// ```
#[macro_export]
macro_rules! assert_succeeded {
    ($result:expr) => {{
        let result = &$result;
        if result.failed() {
            panic!(
                "Expected success, got fallback after {} attempts: {:?}",
                result.attempts(),
                result.failure_cause()
            );
        }
    }};
    ($result:expr, $expected:expr) => {{
        let result = &$result;
        $crate::assert_succeeded!(result);
        assert_eq!(result.success_value(), Some(&$expected));
    }};
}

/// Assert that an execution fell back to a handler, optionally with a given
/// fallback value.
///
/// # Example
///
/// ```rust
/// use failover::{assert_fell_back, AnyFailure, RetryEngine};
///
/// let engine = RetryEngine::configure_execution(|| Err::<&str, _>("down"), 2)
///     .unwrap()
///     .on_failure::<AnyFailure, _>(|_| "cached");
/// assert_fell_back!(engine.execute().unwrap(), "cached");
/// ```
#[macro_export]
macro_rules! assert_fell_back {
    ($result:expr) => {{
        let result = &$result;
        if !result.failed() {
            panic!(
                "Expected fallback, got success after {} attempts",
                result.attempts()
            );
        }
    }};
    ($result:expr, $expected:expr) => {{
        let result = &$result;
        $crate::assert_fell_back!(result);
        assert_eq!(result.failure_value(), Some(&$expected));
    }};
}
