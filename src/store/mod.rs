//! The `QuadStore` contract: the only interface the
//! evaluation core depends on. On-disk/in-memory storage, the query
//! language parser, and transport are external collaborators and live
//! outside this crate — `memory::MemoryStore` below is the reference
//! implementation used by tests, standing in for a real store backing
//! a store-provided all-iterator.

mod memory;

pub use memory::{MemoryStore, Ref as MemoryRef};

use crate::common::Result;
use crate::context::Context;
use crate::engine::Shape;
use crate::model::{Direction, Quad, QuadValue};
use std::sync::Arc;

/// A ref that knows how to compare itself against other refs of the same
/// store. `Ref` is intentionally *not* a single concrete type shared by
/// every store — it is an opaque identifier produced by the store, and
/// each `QuadStore` picks its own representation and exposes a `Key`
/// usable as a hash/map key.
pub trait RefKey: Eq + std::hash::Hash + Clone + Ord + std::fmt::Debug {}
impl<T: Eq + std::hash::Hash + Clone + Ord + std::fmt::Debug> RefKey for T {}

/// The store contract the evaluation core is built against.
///
/// Implementors are expected to be cheaply `Clone`-able (typically an
/// `Arc` around shared state) since a `Shape` tree holds an `Arc<Self>` and
/// many independent Scanner/Index pairs may be created from one optimized
/// tree.
pub trait QuadStore: Send + Sync + Sized + 'static {
    /// The store's opaque ref representation. An additional "PreFetched"
    /// ref carrying its quad value inline (so `name_of` is free) is a
    /// store-level concern: a store is free to define a ref enum with such
    /// a variant and make `name_of` check it before doing any real lookup.
    type Ref: Clone + std::fmt::Debug;
    /// A comparable key for `Self::Ref`.
    type Key: RefKey;

    /// The comparison key for a ref: two refs denote the same logical value
    /// iff their keys are equal.
    fn key(&self, r: &Self::Ref) -> Self::Key;

    /// Resolves a concrete quad value to a ref, if it exists in the store.
    fn value_of(&self, value: &QuadValue) -> Option<Self::Ref>;

    /// Resolves a ref back to its quad value, if any (refs denoting links
    /// rather than nodes typically have none).
    fn name_of(&self, r: &Self::Ref) -> Option<QuadValue>;

    /// The full quad a link ref denotes.
    fn quad(&self, r: &Self::Ref) -> Option<Quad<Self::Ref>>;

    /// The `dir`-projection of a link ref.
    fn quad_direction(&self, link: &Self::Ref, dir: Direction) -> Option<Self::Ref>;

    /// All links whose `dir`-projection equals `r`, as a sub-`Shape`. Used
    /// by `LinksTo`'s scan mode and `HasA`'s lookup mode.
    fn quad_iterator(&self, dir: Direction, r: &Self::Ref) -> Shape<Self>;

    /// The universe of node refs.
    fn nodes_all_iterator(&self) -> Shape<Self>;

    /// The universe of quad (link) refs.
    fn quads_all_iterator(&self) -> Shape<Self>;

    /// An optional store-side rewrite of an already core-optimized `Shape`,
    /// e.g. folding `HasA(LinksTo(Fixed))` into one direct index probe.
    /// Returns `(replacement, changed)`.
    fn optimize_iterator(&self, shape: &Shape<Self>) -> (Shape<Self>, bool);

    /// Batch-resolves quad values to refs, with a per-element result so one
    /// unresolved entry doesn't fail the whole batch at the store layer
    /// (`Resolver` turns an unresolved entry into `Error::NotFound`).
    fn refs_of(&self, ctx: &Context, values: &[QuadValue]) -> Result<Vec<Option<Self::Ref>>>;

    /// A store-reported fan-out estimate for a single node along `dir`,
    /// used by `LinksTo`'s size estimation when the primary is `Fixed`.
    /// `None` falls back to the `FANOUT_FACTOR` heuristic.
    fn fanout(&self, _dir: Direction, _r: &Self::Ref) -> Option<i64> {
        None
    }

    /// Builds the ref denoting integer id `id` of the given kind. Backs the
    /// `Int64Range` reference implementation of `All`: real
    /// deployments substitute a store-provided all-iterator instead of
    /// calling this directly.
    fn ref_for_id(&self, kind: RefKind, id: i64) -> Self::Ref;

    /// The numeric payload of a ref built by `ref_for_id`, if it was built
    /// that way. `Int64Range::contains` uses this to test range membership
    /// without a full store round trip.
    fn numeric_id(&self, r: &Self::Ref) -> Option<i64>;
}

/// Whether an `Int64Range`/`All` shape enumerates nodes or links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefKind {
    Node,
    Link,
}

/// Convenience alias for a shared store handle, the shape every `Shape<S>`
/// actually stores.
pub type StoreHandle<S> = Arc<S>;
