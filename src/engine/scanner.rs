use crate::common::Result;
use crate::context::Context;
use crate::store::QuadStore;
use crate::tag::TagMap;

/// Produces a lazy, finite sequence of result refs.
///
/// `result()` is only defined after `next`/`next_path` returns `true`, and
/// remains valid until the next call to `next`/`close`. Implementations
/// keep their own cursor state; a `Shape` is immutable and may back many
/// independent `Scanner`s.
pub trait Scanner<S: QuadStore> {
    /// Advances to the next result. Returns `false` on exhaustion or error
    /// (check `err()` to distinguish the two).
    fn next(&mut self, ctx: &Context) -> Result<bool>;

    /// The current result, if `next`/`next_path` last returned `true`.
    fn result(&self) -> Option<S::Ref>;

    /// Advances to an alternative derivation path for the *current* result
    /// without changing `result()`. Returns `false` when there is no
    /// further alternative (most operators have none and always return
    /// `false` here; `HasA`, `And`, and `Recursive` are the operators that
    /// do).
    fn next_path(&mut self, ctx: &Context) -> Result<bool>;

    /// Fills `dst` with every tag bound along the path from the root to the
    /// current result.
    fn tag_results(&self, dst: &mut TagMap<S::Ref>);

    /// The first error observed by this handle or any of its closed-over
    /// sub-handles, if any.
    fn err(&self) -> Option<&crate::common::Error>;

    /// Releases resources. Idempotent; subsequent calls return the first
    /// error observed. Closing a parent handle closes its sub-handles.
    fn close(&mut self) -> Result<()>;
}

/// A boxed, type-erased Scanner, the handle type most call sites work with.
pub type BoxScanner<S> = Box<dyn Scanner<S>>;
