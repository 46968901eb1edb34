//! The retry engine: run an operation, retry it, and fall back by failure type.
//!
//! An engine is configured through calls that each return a *new* engine,
//! so an engine obtained earlier keeps behaving exactly as it did. Nothing
//! runs until [`RetryEngine::execute`] is called.
//!
//! # Quick Start
//!
//! ```rust
//! use failover::{AnyFailure, RetryEngine};
//! use std::io;
//! use std::time::Duration;
//!
//! let engine = RetryEngine::configure_execution_with_delay(
//!     || std::fs::read_to_string("/definitely/not/here"),
//!     3,
//!     Duration::from_millis(1),
//! )
//! .unwrap()
//! .on_failure::<io::Error, _>(|e| format!("io failure: {}", e.kind()))
//! .on_failure::<AnyFailure, _>(|e| format!("unexpected: {e}"));
//!
//! let result = engine.execute().unwrap();
//! assert!(result.failed());
//! assert_eq!(result.attempts(), 3);
//! assert!(result.failure_value().unwrap().starts_with("io failure"));
//! ```
//!
//! # Execution
//!
//! Each call to `execute` starts from the first attempt with its own counter:
//!
//! 1. Invoke the operation. On success, return its value.
//! 2. On failure, if attempts remain, pause for the configured delay (if any)
//!    and go back to 1.
//! 3. Once the budget is spent, hand the final failure to the first handler,
//!    in registration order, whose category accepts it.
//! 4. If no handler accepts it, return [`UnhandledFailure`].

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{BoxError, ConfigError, DynError, UnhandledFailure};
use crate::handler::{FailureCategory, HandlerBinding, HandlerRegistry};
use crate::outcome::RetryResult;
use crate::plan::ExecutionPlan;

/// Information about a failed attempt that is about to be retried, passed to
/// the hook registered with [`RetryEngine::on_retry`].
#[derive(Debug, Clone)]
pub struct RetryEvent<'a> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The failure from that attempt.
    pub error: &'a DynError,
    /// Pause before the next attempt.
    pub next_delay: Duration,
    /// Total elapsed time since the first attempt started.
    pub elapsed: Duration,
}

type RetryHook = Arc<dyn Fn(&RetryEvent<'_>) + Send + Sync>;

/// An operation with its retry budget and fallback handlers.
///
/// `S` is the success type and `F` the fallback type produced by handlers.
/// Engines are cheap to clone, `Send` and `Sync`; all per-execution state
/// lives on the stack of [`execute`](Self::execute), so one engine can be
/// executed repeatedly and from several threads at once.
pub struct RetryEngine<S, F> {
    plan: ExecutionPlan<S>,
    handlers: HandlerRegistry<F>,
    on_retry: Option<RetryHook>,
}

impl<S: 'static> RetryEngine<S, S> {
    /// Configure an engine whose fallback type equals its success type.
    ///
    /// `attempts` counts the first try; `1` means no retry. The operation
    /// is not invoked here.
    ///
    /// Returns [`ConfigError::ZeroAttempts`] if `attempts` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use failover::RetryEngine;
    ///
    /// let engine = RetryEngine::configure_execution(|| Ok::<_, std::io::Error>(42), 5).unwrap();
    /// assert_eq!(engine.execute().unwrap().into_success(), Some(42));
    /// ```
    pub fn configure_execution<Op, E>(operation: Op, attempts: u32) -> Result<Self, ConfigError>
    where
        Op: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        ExecutionPlan::new(operation, attempts).map(Self::from_plan)
    }

    /// Like [`configure_execution`](Self::configure_execution), pausing for
    /// `delay` between a failed attempt and the next one.
    pub fn configure_execution_with_delay<Op, E>(
        operation: Op,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, ConfigError>
    where
        Op: Fn() -> Result<S, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        ExecutionPlan::new(operation, attempts)
            .map(|plan| Self::from_plan(plan.with_delay(delay)))
    }
}

impl<S: 'static, F: 'static> RetryEngine<S, F> {
    /// Create an engine with no handlers from an existing plan.
    ///
    /// Use this when the fallback type differs from the success type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use failover::{AnyFailure, ExecutionPlan, RetryEngine};
    ///
    /// let plan = ExecutionPlan::new(|| Err::<u64, _>("offline"), 2).unwrap();
    /// let engine = RetryEngine::<u64, &str>::from_plan(plan)
    ///     .on_failure::<AnyFailure, _>(|_| "cached");
    ///
    /// let result = engine.execute().unwrap();
    /// assert_eq!(result.failure_value(), Some(&"cached"));
    /// ```
    pub fn from_plan(plan: ExecutionPlan<S>) -> Self {
        Self {
            plan,
            handlers: HandlerRegistry::new(),
            on_retry: None,
        }
    }

    /// Return a new engine with `handler` appended, bound to category `C`.
    ///
    /// The receiver is left as it was. Handlers are consulted in the order
    /// they were added, and only once the attempt budget is exhausted.
    pub fn on_failure<C, H>(&self, handler: H) -> Self
    where
        C: FailureCategory,
        H: Fn(&C::Failure) -> F + Send + Sync + 'static,
    {
        Self {
            plan: self.plan.clone(),
            handlers: self
                .handlers
                .with_binding(HandlerBinding::new::<C, H>(handler)),
            on_retry: self.on_retry.clone(),
        }
    }

    /// Return a new engine with a side-effect-only handler for category `C`.
    ///
    /// When selected, `action` runs and the fallback value is `F::default()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use failover::{AnyFailure, RetryEngine};
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use std::sync::Arc;
    ///
    /// let alerted = Arc::new(AtomicBool::new(false));
    /// let flag = Arc::clone(&alerted);
    ///
    /// let engine = RetryEngine::configure_execution(|| Err::<Vec<u8>, _>("down"), 1)
    ///     .unwrap()
    ///     .on_failure_run::<AnyFailure, _>(move |_| flag.store(true, Ordering::SeqCst));
    ///
    /// let result = engine.execute().unwrap();
    /// assert!(alerted.load(Ordering::SeqCst));
    /// assert_eq!(result.failure_value(), Some(&Vec::new()));
    /// ```
    pub fn on_failure_run<C, A>(&self, action: A) -> Self
    where
        C: FailureCategory,
        A: Fn(&C::Failure) + Send + Sync + 'static,
        F: Default,
    {
        self.on_failure::<C, _>(move |failure: &C::Failure| {
            action(failure);
            F::default()
        })
    }

    /// Return a new engine that calls `hook` after each failed attempt that
    /// will be retried. The final failed attempt does not trigger the hook.
    ///
    /// A later call replaces the hook.
    pub fn on_retry<H>(&self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_>) + Send + Sync + 'static,
    {
        Self {
            plan: self.plan.clone(),
            handlers: self.handlers.clone(),
            on_retry: Some(Arc::new(hook)),
        }
    }

    /// Return a new engine with a different attempt budget.
    pub fn with_attempts(&self, attempts: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            plan: self.plan.with_attempts(attempts)?,
            handlers: self.handlers.clone(),
            on_retry: self.on_retry.clone(),
        })
    }

    /// Return a new engine with a different pause between attempts.
    pub fn with_delay(&self, delay: Duration) -> Self {
        Self {
            plan: self.plan.with_delay(delay),
            handlers: self.handlers.clone(),
            on_retry: self.on_retry.clone(),
        }
    }

    /// The engine's execution plan.
    pub fn plan(&self) -> &ExecutionPlan<S> {
        &self.plan
    }

    /// The engine's handlers, in registration order.
    pub fn handlers(&self) -> &HandlerRegistry<F> {
        &self.handlers
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run the operation, retrying and falling back as configured.
    ///
    /// Blocks the calling thread for the configured delay between attempts.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledFailure`] if every attempt failed and no handler
    /// accepts the final failure.
    pub fn execute(&self) -> Result<RetryResult<S, F>, UnhandledFailure> {
        let start = Instant::now();
        let budget = self.plan.attempts();
        let delay = self.plan.delay();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let error = match self.plan.invoke() {
                Ok(value) => return Ok(RetryResult::succeeded(value, attempt, start.elapsed())),
                Err(error) => error,
            };

            if attempt >= budget {
                return self.fall_back(error, attempt, start.elapsed());
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, budget, delay = ?delay, error = %error, "attempt failed, retrying");

            if let Some(hook) = &self.on_retry {
                hook(&RetryEvent {
                    attempt,
                    error: error.as_ref(),
                    next_delay: delay,
                    elapsed: start.elapsed(),
                });
            }

            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn fall_back(
        &self,
        cause: BoxError,
        attempts: u32,
        elapsed: Duration,
    ) -> Result<RetryResult<S, F>, UnhandledFailure> {
        #[cfg(feature = "tracing")]
        tracing::warn!(attempts, error = %cause, "attempt budget exhausted");

        match self.handlers.resolve(cause.as_ref()) {
            Some((category, value)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(category, "fallback handler selected");
                Ok(RetryResult::fell_back(value, cause, attempts, elapsed))
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    attempts,
                    handlers = self.handlers.len(),
                    error = %cause,
                    "no handler registered for failure"
                );
                Err(UnhandledFailure::new(cause, attempts, elapsed))
            }
        }
    }
}

impl<S, F> Clone for RetryEngine<S, F> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            handlers: self.handlers.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<S, F> fmt::Debug for RetryEngine<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryEngine")
            .field("plan", &self.plan)
            .field("handlers", &self.handlers)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}
