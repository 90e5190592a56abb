use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Yields exactly one result: the cardinality of `child`. Uses
/// `child.stats().size` directly when it's an exact bound; otherwise
/// pays for a full scan (including `next_path` expansions) to count.
#[derive(Clone)]
pub struct CountShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
}

impl<S: QuadStore> CountShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let child = self.child.stats(store);
        Costs::new(child.next_cost.max(1), 1, Size::exact(1))
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(CountScanner {
            store,
            child: self.child.clone(),
            count: None,
            err: None,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(CountIndex {
            store,
            child: self.child.clone(),
            count: None,
            err: None,
        })
    }
}

fn exact_count<S: QuadStore>(ctx: &Context, store: &StoreHandle<S>, child: &Arc<Shape<S>>) -> Result<i64> {
    if let Size { value, exact: true } = child.stats(store).size {
        return Ok(value);
    }
    let mut scanner = child.scanner(store.clone());
    let mut n = 0i64;
    while scanner.next(ctx)? {
        n += 1;
        while scanner.next_path(ctx)? {
            n += 1;
        }
    }
    let err = scanner.err().cloned();
    scanner.close()?;
    match err {
        Some(e) => Err(e),
        None => Ok(n),
    }
}

struct CountScanner<S: QuadStore> {
    store: StoreHandle<S>,
    child: Arc<Shape<S>>,
    count: Option<i64>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Scanner<S> for CountScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.count.is_some() || self.err.is_some() {
            return Ok(false);
        }
        match exact_count(ctx, &self.store, &self.child) {
            Ok(n) => {
                self.count = Some(n);
                Ok(true)
            }
            Err(e) => {
                self.err = Some(e);
                Ok(false)
            }
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.count.map(|n| self.store.ref_for_id(crate::store::RefKind::Node, n))
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&crate::common::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct CountIndex<S: QuadStore> {
    store: StoreHandle<S>,
    child: Arc<Shape<S>>,
    count: Option<i64>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Index<S> for CountIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if self.count.is_none() {
            match exact_count(ctx, &self.store, &self.child) {
                Ok(n) => self.count = Some(n),
                Err(e) => {
                    self.err = Some(e);
                    return Ok(false);
                }
            }
        }
        let n = self.count.expect("just set");
        Ok(self.store.numeric_id(candidate) == Some(n))
    }

    fn result(&self) -> Option<S::Ref> {
        self.count.map(|n| self.store.ref_for_id(crate::store::RefKind::Node, n))
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&crate::common::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
