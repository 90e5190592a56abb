use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, QuadValue, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// A value-range filter. `op` is one of `<`, `<=`, `>`, `>=`; the
/// operand carries a concrete `QuadValue` kind. A candidate passes when
/// the store resolves its name to a value of the *same* kind and the
/// comparison holds; a kind mismatch fails the predicate rather than
/// erroring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Clone)]
pub struct ComparisonShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    pub op: CompareOp,
    pub operand: QuadValue,
}

impl<S: QuadStore> ComparisonShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let child = self.child.stats(store);
        Costs::new(
            child.next_cost + 1,
            child.contains_cost + 1,
            Size::estimate(child.size.value),
        )
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(ComparisonScanner {
            op: self.op,
            operand: self.operand.clone(),
            store: store.clone(),
            child: self.child.scanner(store),
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(ComparisonIndex {
            op: self.op,
            operand: self.operand.clone(),
            store: store.clone(),
            child: self.child.index(store),
            result: None,
        })
    }
}

struct ComparisonScanner<S: QuadStore> {
    op: CompareOp,
    operand: QuadValue,
    store: StoreHandle<S>,
    child: BoxScanner<S>,
}

impl<S: QuadStore> ComparisonScanner<S> {
    fn passes(&self, candidate: &S::Ref) -> bool {
        let Some(value) = self.store.name_of(candidate) else {
            return false;
        };
        match value.partial_compare(&self.operand) {
            Some(ordering) => self.op.holds(ordering),
            None => false,
        }
    }
}

impl<S: QuadStore> Scanner<S> for ComparisonScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if !self.child.next(ctx)? {
                return Ok(false);
            }
            let candidate = self.child.result().expect("next() returned true");
            if self.passes(&candidate) {
                return Ok(true);
            }
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

    fn err(&self) -> Option<&crate::common::Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}

struct ComparisonIndex<S: QuadStore> {
    op: CompareOp,
    operand: QuadValue,
    store: StoreHandle<S>,
    child: BoxIndex<S>,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for ComparisonIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if !self.child.contains(ctx, candidate)? {
            self.result = None;
            return Ok(false);
        }
        let passes = match self.store.name_of(candidate) {
            Some(value) => value
                .partial_compare(&self.operand)
                .map(|o| self.op.holds(o))
                .unwrap_or(false),
            None => false,
        };
        self.result = passes.then(|| candidate.clone());
        Ok(passes)
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.child.tag_results(dst)
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}
