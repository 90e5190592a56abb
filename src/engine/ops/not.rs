use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Complement relative to `universe`. `Not` only has a lookup
/// mode in the general case: a candidate is in the result iff it's
/// absent from `child`. Iteration mode scans `universe` and tests each
/// candidate against `child`'s index, so `universe` must be supplied —
/// the optimizer fills in `nodes_all_iterator`/`quads_all_iterator` when
/// one isn't given explicitly.
#[derive(Clone)]
pub struct NotShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    pub universe: Arc<Shape<S>>,
}

impl<S: QuadStore> NotShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let universe = self.universe.stats(store);
        let child = self.child.stats(store);
        let size = crate::model::Size {
            value: (universe.size.value - child.size.value).max(0),
            exact: false,
        };
        Costs::new(
            universe.next_cost + child.contains_cost,
            child.contains_cost + 1,
            size,
        )
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(NotScanner {
            universe: self.universe.scanner(store.clone()),
            child: self.child.index(store),
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(NotIndex {
            child: self.child.index(store),
            result: None,
        })
    }
}

struct NotScanner<S: QuadStore> {
    universe: BoxScanner<S>,
    child: BoxIndex<S>,
}

impl<S: QuadStore> Scanner<S> for NotScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if !self.universe.next(ctx)? {
                return Ok(false);
            }
            let candidate = self.universe.result().expect("next() returned true");
            if !self.child.contains(ctx, &candidate)? {
                return Ok(true);
            }
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.universe.result()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.universe.tag_results(dst)
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.universe.err().or_else(|| self.child.err())
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Err(e) = self.universe.close() {
            first_err.get_or_insert(e);
        }
        if let Err(e) = self.child.close() {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct NotIndex<S: QuadStore> {
    child: BoxIndex<S>,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for NotIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        let absent = !self.child.contains(ctx, candidate)?;
        self.result = absent.then(|| candidate.clone());
        Ok(absent)
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&crate::common::Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}
