use crate::common::{Error, Result};
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Non-filtering left-join marker, only ever composed under `And`.
/// It has no independent scan mode: cost is `+∞` so the optimizer never
/// picks it as a primary. `contains` always succeeds; it just records
/// whether the wrapped subtree also matched, which `tag_results` and
/// `next_path` consult.
#[derive(Clone)]
pub struct OptionalShape<S: QuadStore> {
    pub sub: Arc<Shape<S>>,
}

impl<S: QuadStore> OptionalShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let sub = self.sub.stats(store);
        Costs::new(i64::MAX, sub.contains_cost, Size::estimate(0))
    }

    pub fn scanner(&self, _store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(OptionalScanner { err: None })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(OptionalIndex {
            sub: self.sub.index(store),
            matched: false,
            result: None,
        })
    }
}

struct OptionalScanner {
    err: Option<Error>,
}

impl<S: QuadStore> Scanner<S> for OptionalScanner {
    fn next(&mut self, _ctx: &Context) -> Result<bool> {
        let result: Result<bool> = (|| crate::invariant!("Optional has no scan mode; compose it under And"))();
        if let Err(e) = &result {
            self.err = Some(e.clone());
        }
        result
    }

    fn result(&self) -> Option<S::Ref> {
        None
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

struct OptionalIndex<S: QuadStore> {
    sub: BoxIndex<S>,
    matched: bool,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for OptionalIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        self.matched = self.sub.contains(ctx, candidate)?;
        self.result = Some(candidate.clone());
        Ok(true)
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        if self.matched {
            self.sub.next_path(ctx)
        } else {
            Ok(false)
        }
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if self.matched {
            self.sub.tag_results(dst);
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.sub.err()
    }

    fn close(&mut self) -> Result<()> {
        self.sub.close()
    }
}
