//! Failure categories and the ordered registry of fallback handlers.
//!
//! A handler is bound to a [`FailureCategory`]. After the attempt budget is
//! exhausted, the registry is scanned in registration order and the first
//! binding whose category accepts the final failure produces the fallback
//! value. Specificity plays no part: a broad category registered first wins
//! over a narrower one registered later.
//!
//! Every concrete error type is its own category and matches by downcast.
//! [`AnyFailure`] is the root category and matches everything. Broader
//! categories that group several concrete types are written by implementing
//! [`FailureCategory`] on a marker type:
//!
//! ```rust
//! use failover::{DynError, FailureCategory};
//! use std::fmt;
//!
//! #[derive(Debug)]
//! struct DiskFull;
//! impl fmt::Display for DiskFull {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         f.write_str("disk full")
//!     }
//! }
//! impl std::error::Error for DiskFull {}
//!
//! /// Any storage-related failure.
//! struct Storage;
//!
//! impl FailureCategory for Storage {
//!     type Failure = DynError;
//!
//!     fn narrow(failure: &DynError) -> Option<&DynError> {
//!         (failure.is::<DiskFull>() || failure.is::<std::io::Error>()).then_some(failure)
//!     }
//! }
//!
//! let failure: Box<DynError> = Box::new(DiskFull);
//! assert!(Storage::narrow(failure.as_ref()).is_some());
//! ```

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::error::DynError;

/// A family of failures a handler can be bound to.
///
/// `narrow` decides whether a failure belongs to the category and, if so,
/// produces the view handed to the handler.
pub trait FailureCategory: 'static {
    /// What a handler bound to this category receives.
    type Failure: ?Sized;

    /// Return the failure viewed as this category, or `None` if it does not
    /// belong to it.
    fn narrow(failure: &DynError) -> Option<&Self::Failure>;

    /// Human-readable category name, used in logs and introspection.
    fn name() -> &'static str {
        type_name::<Self>()
    }
}

impl<E> FailureCategory for E
where
    E: StdError + Send + Sync + 'static,
{
    type Failure = E;

    fn narrow(failure: &DynError) -> Option<&E> {
        failure.downcast_ref::<E>()
    }
}

/// The root category: accepts every failure.
///
/// Register a handler for `AnyFailure` last to catch whatever the more
/// specific handlers let through.
///
/// # Examples
///
/// ```rust
/// use failover::{AnyFailure, RetryEngine};
///
/// let engine = RetryEngine::configure_execution(|| Err::<String, _>("boom"), 2)
///     .unwrap()
///     .on_failure::<AnyFailure, _>(|failure| format!("recovered from {failure}"));
///
/// let result = engine.execute().unwrap();
/// assert_eq!(result.failure_value().unwrap(), "recovered from boom");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnyFailure;

impl FailureCategory for AnyFailure {
    type Failure = DynError;

    fn narrow(failure: &DynError) -> Option<&DynError> {
        Some(failure)
    }

    fn name() -> &'static str {
        "AnyFailure"
    }
}

type Resolver<F> = Arc<dyn Fn(&DynError) -> Option<F> + Send + Sync>;

/// One (category, handler) pair.
pub struct HandlerBinding<F> {
    category: &'static str,
    resolve: Resolver<F>,
}

impl<F: 'static> HandlerBinding<F> {
    /// Bind `handler` to the failures accepted by category `C`.
    pub fn new<C, H>(handler: H) -> Self
    where
        C: FailureCategory,
        H: Fn(&C::Failure) -> F + Send + Sync + 'static,
    {
        let resolve: Resolver<F> =
            Arc::new(move |failure: &DynError| C::narrow(failure).map(|narrowed| handler(narrowed)));
        Self {
            category: C::name(),
            resolve,
        }
    }
}

impl<F> HandlerBinding<F> {
    /// Name of the category this handler is bound to.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Run the handler if the failure belongs to this binding's category.
    pub fn try_handle(&self, failure: &DynError) -> Option<F> {
        (self.resolve)(failure)
    }
}

impl<F> Clone for HandlerBinding<F> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<F> fmt::Debug for HandlerBinding<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Handlers in the order they were registered.
///
/// The registry never changes in place: [`with_binding`](Self::with_binding)
/// copies the sequence and appends to the copy.
pub struct HandlerRegistry<F> {
    bindings: Vec<HandlerBinding<F>>,
}

impl<F> HandlerRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Return a new registry holding these bindings followed by `binding`.
    pub fn with_binding(&self, binding: HandlerBinding<F>) -> Self {
        let mut bindings = Vec::with_capacity(self.bindings.len() + 1);
        bindings.extend(self.bindings.iter().cloned());
        bindings.push(binding);
        Self { bindings }
    }

    /// Find the first binding, in registration order, whose category accepts
    /// `failure`, and run its handler.
    ///
    /// Returns the matched category name alongside the fallback value.
    pub fn resolve(&self, failure: &DynError) -> Option<(&'static str, F)> {
        self.bindings
            .iter()
            .find_map(|binding| binding.try_handle(failure).map(|value| (binding.category, value)))
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Category names in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(HandlerBinding::category)
    }
}

impl<F> Default for HandlerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for HandlerRegistry<F> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
        }
    }
}

impl<F> fmt::Debug for HandlerRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.categories()).finish()
    }
}
