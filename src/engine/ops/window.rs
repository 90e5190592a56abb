use crate::common::{Error, Result};
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// `Limit(n)`: forwards at most `n` successful `next` calls.
/// `Limit(0)` is unwrapped by the optimizer before it ever reaches here.
#[derive(Clone)]
pub struct LimitShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    pub n: i64,
}

impl<S: QuadStore> LimitShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let child = self.child.stats(store);
        let value = child.size.value.min(self.n);
        Costs::new(child.next_cost, child.contains_cost, Size { value, exact: child.size.exact })
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(LimitScanner {
            child: self.child.scanner(store),
            n: self.n,
            taken: 0,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        self.child.index(store)
    }
}

struct LimitScanner<S: QuadStore> {
    child: BoxScanner<S>,
    n: i64,
    taken: i64,
}

impl<S: QuadStore> Scanner<S> for LimitScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.taken >= self.n {
            return Ok(false);
        }
        if self.child.next(ctx)? {
            self.taken += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next_path(ctx)
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

/// `Skip(k)`: drops the first `k` results via `k` calls to `next`, then
/// forwards. `Skip(0)` is unwrapped by the optimizer.
#[derive(Clone)]
pub struct SkipShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    pub k: i64,
}

impl<S: QuadStore> SkipShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let child = self.child.stats(store);
        let value = (child.size.value - self.k).max(0);
        Costs::new(child.next_cost, child.contains_cost, Size { value, exact: child.size.exact })
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(SkipScanner {
            child: self.child.scanner(store),
            k: self.k,
            skipped: false,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        self.child.index(store)
    }
}

struct SkipScanner<S: QuadStore> {
    child: BoxScanner<S>,
    k: i64,
    skipped: bool,
}

impl<S: QuadStore> Scanner<S> for SkipScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if !self.skipped {
            for _ in 0..self.k {
                if !self.child.next(ctx)? {
                    self.skipped = true;
                    return Ok(false);
                }
            }
            self.skipped = true;
        }
        self.child.next(ctx)
    }

    fn result(&self) -> Option<S::Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next_path(ctx)
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
