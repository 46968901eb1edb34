//! # Failover
//!
//! Run a fallible operation, retry it a fixed number of times, and if it
//! never succeeds, fall back to a handler chosen by the failure's type.
//!
//! ## Principles
//!
//! - **Immutable configuration**: every configuration call returns a new
//!   engine; engines obtained earlier are never changed.
//! - **Lazy**: nothing runs until [`RetryEngine::execute`] is called.
//! - **Ordered fallback**: handlers are consulted in registration order and
//!   the first one whose [`FailureCategory`] accepts the failure wins.
//! - **Loud when unhandled**: a failure no handler accepts is returned as an
//!   [`UnhandledFailure`] error, not folded into the result.
//!
//! ## Quick Example
//!
//! ```rust
//! use failover::{AnyFailure, RetryEngine};
//! use std::fmt;
//!
//! #[derive(Debug)]
//! struct DirectoryNotFound;
//!
//! impl fmt::Display for DirectoryNotFound {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         f.write_str("directory not found")
//!     }
//! }
//!
//! impl std::error::Error for DirectoryNotFound {}
//!
//! let engine = RetryEngine::configure_execution(|| Err::<String, _>(DirectoryNotFound), 3)
//!     .unwrap()
//!     .on_failure::<DirectoryNotFound, _>(|_| "Hello World".to_string())
//!     .on_failure::<AnyFailure, _>(|e| format!("unexpected: {e}"));
//!
//! let result = engine.execute().unwrap();
//! assert!(result.failed());
//! assert_eq!(result.failure_value().unwrap(), "Hello World");
//! assert_eq!(result.attempts(), 3);
//! ```
//!
//! ## Feature flags
//!
//! - `tracing`: emit `tracing` events for retries, fallbacks and unhandled
//!   failures.
//! - `serde`: `Serialize`/`Deserialize` for [`RetrySettings`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod engine;
pub mod error;
pub mod handler;
pub mod outcome;
pub mod plan;
pub mod settings;
pub mod testing;

// Re-exports
pub use engine::{RetryEngine, RetryEvent};
pub use error::{BoxError, ConfigError, DynError, UnhandledFailure};
pub use handler::{AnyFailure, FailureCategory, HandlerBinding, HandlerRegistry};
pub use outcome::RetryResult;
pub use plan::{ExecutionPlan, ExecutionPlanBuilder};
pub use settings::RetrySettings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::RetryEngine;
    pub use crate::error::{BoxError, ConfigError, UnhandledFailure};
    pub use crate::handler::{AnyFailure, FailureCategory};
    pub use crate::outcome::RetryResult;
    pub use crate::plan::ExecutionPlan;
    pub use crate::settings::RetrySettings;
}
