//! Error handling shared across the crate.

use std::fmt;

/// The result type used throughout `quadcore`.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced by the query-evaluation core.
///
/// These are semantic, not a 1:1 wrapper of any particular store's error
/// type: a concrete `QuadStore` surfaces its own failures through
/// `Error::Store`, boxed behind `std::error::Error` so the core never needs
/// to know the store's concrete error representation.
#[derive(Debug, Clone)]
pub enum Error {
    /// Raised by the store, surfaced unchanged. Held behind an `Arc` (rather
    /// than a plain `Box`) so the first error an operator observes can be
    /// cheaply retained and handed back from every later `err()` call
    /// without re-deriving it.
    Store(std::sync::Arc<dyn std::error::Error + Send + Sync>),
    /// A `Resolver` could not resolve a quad value to a ref.
    NotFound(String),
    /// The evaluation's `Context` was cancelled.
    Cancelled,
    /// An operator was used out of contract (e.g. scanning `Optional`).
    /// Signals a bug in the caller or in a rewrite, not bad input data.
    Invariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Cancelled => write!(f, "evaluation cancelled"),
            Self::Invariant(msg) => write!(f, "invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Wraps a store-side error as `Error::Store`.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(std::sync::Arc::new(err))
    }
}

/// Builds an `Err(Error::NotFound(...))` from a format string.
#[macro_export]
macro_rules! not_found {
    ($($arg:tt)*) => {
        return Err($crate::common::Error::NotFound(format!($($arg)*)))
    };
}

/// Builds an `Err(Error::Invariant(...))` from a format string: used at
/// every contract boundary an operator must not cross (e.g. scanning
/// `Optional` directly, or calling `result()` before a successful `next`).
#[macro_export]
macro_rules! invariant {
    ($($arg:tt)*) => {
        return Err($crate::common::Error::Invariant(format!($($arg)*)))
    };
}
