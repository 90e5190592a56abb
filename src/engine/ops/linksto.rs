use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::ops::fixed::FixedShape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Direction, Size, FANOUT_FACTOR};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Projects node refs to link refs along `dir`, the dual
/// of `HasA`.
#[derive(Clone)]
pub struct LinksToShape<S: QuadStore> {
    pub primary: Arc<Shape<S>>,
    pub dir: Direction,
}

impl<S: QuadStore> LinksToShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let primary_costs = self.primary.stats(store);
        let size = if let Shape::Fixed(fixed) = self.primary.as_ref() {
            sum_fanout(store, self.dir, fixed)
        } else {
            primary_costs.size.scale(FANOUT_FACTOR, false)
        };
        Costs::new(
            primary_costs.next_cost + 1,
            primary_costs.contains_cost + 1,
            size,
        )
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(LinksToScanner {
            dir: self.dir,
            store: store.clone(),
            primary: self.primary.scanner(store),
            link_iter: None,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(LinksToIndex {
            dir: self.dir,
            store: store.clone(),
            primary_index: self.primary.index(store),
            result: None,
        })
    }
}

fn sum_fanout<S: QuadStore>(store: &S, dir: Direction, fixed: &FixedShape<S::Ref>) -> Size {
    let mut total = 0i64;
    let mut exact = true;
    for r in &fixed.values {
        match store.fanout(dir, r) {
            Some(n) => total += n,
            None => {
                total += FANOUT_FACTOR;
                exact = false;
            }
        }
    }
    Size { value: total, exact }
}

struct LinksToScanner<S: QuadStore> {
    dir: Direction,
    store: StoreHandle<S>,
    primary: BoxScanner<S>,
    link_iter: Option<BoxScanner<S>>,
}

impl<S: QuadStore> Scanner<S> for LinksToScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if let Some(iter) = &mut self.link_iter {
                if iter.next(ctx)? {
                    return Ok(true);
                }
                self.link_iter = None;
            }
            if !self.primary.next(ctx)? {
                return Ok(false);
            }
            let node = self.primary.result().expect("next() returned true");
            self.link_iter = Some(
                self.store
                    .quad_iterator(self.dir, &node)
                    .scanner(self.store.clone()),
            );
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.link_iter.as_ref().and_then(|iter| iter.result())
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        if let Some(iter) = &mut self.link_iter {
            if iter.next_path(ctx)? {
                return Ok(true);
            }
        }
        self.primary.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.primary.tag_results(dst);
        if let Some(iter) = &self.link_iter {
            iter.tag_results(dst);
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.link_iter
            .as_ref()
            .and_then(|iter| iter.err())
            .or_else(|| self.primary.err())
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Some(mut iter) = self.link_iter.take() {
            if let Err(e) = iter.close() {
                first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self.primary.close() {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct LinksToIndex<S: QuadStore> {
    dir: Direction,
    store: StoreHandle<S>,
    primary_index: BoxIndex<S>,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for LinksToIndex<S> {
    fn contains(&mut self, ctx: &Context, link: &S::Ref) -> Result<bool> {
        let Some(node) = self.store.quad_direction(link, self.dir) else {
            self.result = None;
            return Ok(false);
        };
        let found = self.primary_index.contains(ctx, &node)?;
        self.result = found.then(|| link.clone());
        Ok(found)
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.primary_index.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.primary_index.tag_results(dst)
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.primary_index.err()
    }

    fn close(&mut self) -> Result<()> {
        self.primary_index.close()
    }
}
