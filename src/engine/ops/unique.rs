use crate::common::{Error, Result};
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::collections::HashSet;
use std::sync::Arc;

/// De-duplicates in scan mode, keyed by `store.key(ref)`. Lookup
/// mode is pass-through: it accepts whatever the child accepts, since a
/// single `contains` call can't observe duplication. `next_path` always
/// returns `false` so results stay genuinely unique even when the child
/// has alternate derivations.
#[derive(Clone)]
pub struct UniqueShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
}

impl<S: QuadStore> UniqueShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let child = self.child.stats(store);
        Costs::new(
            child.next_cost,
            child.contains_cost * crate::model::UNIQUENESS_FACTOR,
            child.size,
        )
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        let child = self.child.scanner(store.clone());
        Box::new(UniqueScanner {
            store,
            child,
            seen: HashSet::new(),
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        self.child.index(store)
    }
}

struct UniqueScanner<S: QuadStore> {
    store: StoreHandle<S>,
    child: BoxScanner<S>,
    seen: HashSet<S::Key>,
}

impl<S: QuadStore> Scanner<S> for UniqueScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if !self.child.next(ctx)? {
                return Ok(false);
            }
            let candidate = self.child.result().expect("next() returned true");
            if self.seen.insert(self.store.key(&candidate)) {
                return Ok(true);
            }
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.child.result()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.child.tag_results(dst)
    }

    fn err(&self) -> Option<&Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}
