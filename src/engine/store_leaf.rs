//! Extension point for store-provided leaf shapes. A `QuadStore` whose
//! backing representation doesn't fit `All`/`Fixed` (e.g. a leaf backed
//! by a secondary index the core has no variant for) can hand back a
//! boxed `StoreLeaf` from `optimize_iterator` instead of one of the
//! closed-enum operators.

use crate::engine::{BoxIndex, BoxScanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use dyn_clone::DynClone;

pub trait StoreLeaf<S: QuadStore>: DynClone + Send + Sync {
    fn stats(&self, store: &S) -> Costs;
    fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S>;
    fn index(&self, store: StoreHandle<S>) -> BoxIndex<S>;
    fn name(&self) -> &'static str;
}

dyn_clone::clone_trait_object!(<S> StoreLeaf<S> where S: QuadStore);
