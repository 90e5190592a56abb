use crate::common::Result;
use crate::context::Context;
use crate::store::QuadStore;
use crate::tag::TagMap;

/// Tests whether a candidate ref belongs to an operator's relation.
/// The dual-mode agreement invariant ties this to `Scanner`: for every
/// `Shape` but `Unique`, `{v : scan yields v}` equals
/// `{v : lookup().contains(v)}` as multisets.
pub trait Index<S: QuadStore> {
    /// Tests membership of `candidate`. On success, sets `result()` to
    /// `candidate` (by convention — some operators, e.g. `Not`, simply
    /// echo the candidate back).
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool>;

    /// The current result, valid only after `contains` returned `true`.
    fn result(&self) -> Option<S::Ref>;

    /// Advances to an alternative path for the current result. See
    /// `Scanner::next_path`.
    fn next_path(&mut self, ctx: &Context) -> Result<bool>;

    /// Fills `dst` with every tag bound along the path to the current
    /// result.
    fn tag_results(&self, dst: &mut TagMap<S::Ref>);

    /// The first error observed by this handle, if any.
    fn err(&self) -> Option<&crate::common::Error>;

    /// Releases resources. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// A boxed, type-erased Index.
pub type BoxIndex<S> = Box<dyn Index<S>>;
