use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Union. Eager mode visits every child and may yield the same
/// value more than once if several children produce it. Short-circuit
/// mode opens only `children[0]`; if it yields at least one result, the
/// rest are never consulted, otherwise it falls through to the next
/// child. Both modes share the same scan loop below; short-circuit just
/// stops advancing once a child has yielded anything.
#[derive(Clone)]
pub struct OrShape<S: QuadStore> {
    pub children: Vec<Arc<Shape<S>>>,
    pub short_circuit: bool,
}

impl<S: QuadStore> OrShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let next_cost: i64 = self.children.iter().map(|c| c.stats(store).next_cost).sum();
        let contains_cost: i64 = self
            .children
            .iter()
            .map(|c| c.stats(store).contains_cost)
            .sum();
        let size = if self.short_circuit {
            self.children
                .iter()
                .map(|c| c.stats(store).size)
                .fold(crate::model::Size::ZERO, |a, b| {
                    if b.value > a.value { b } else { a }
                })
        } else {
            self.children
                .iter()
                .map(|c| c.stats(store).size)
                .fold(crate::model::Size::ZERO, |a, b| a.add(b))
        };
        Costs::new(next_cost, contains_cost, size)
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(OrScanner {
            store,
            children: self.children.clone(),
            short_circuit: self.short_circuit,
            idx: 0,
            current: None,
            current_child_yielded: false,
            done: false,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        let children = self.children.iter().map(|c| c.index(store.clone())).collect();
        Box::new(OrIndex {
            children,
            matched: None,
            result: None,
        })
    }
}

struct OrScanner<S: QuadStore> {
    store: StoreHandle<S>,
    children: Vec<Arc<Shape<S>>>,
    short_circuit: bool,
    idx: usize,
    current: Option<BoxScanner<S>>,
    current_child_yielded: bool,
    done: bool,
}

impl<S: QuadStore> Scanner<S> for OrScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if self.done {
                return Ok(false);
            }
            if self.current.is_none() {
                if self.idx >= self.children.len() {
                    self.done = true;
                    return Ok(false);
                }
                self.current = Some(self.children[self.idx].scanner(self.store.clone()));
                self.current_child_yielded = false;
            }
            let child = self.current.as_mut().expect("just populated");
            if child.next(ctx)? {
                self.current_child_yielded = true;
                return Ok(true);
            }
            self.current.take().expect("present").close()?;
            if self.short_circuit && self.current_child_yielded {
                self.done = true;
                return Ok(false);
            }
            self.idx += 1;
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.as_ref().and_then(|c| c.result())
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        match &mut self.current {
            Some(c) => c.next_path(ctx),
            None => Ok(false),
        }
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let Some(c) = &self.current {
            c.tag_results(dst);
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.current.as_ref().and_then(|c| c.err())
    }

    fn close(&mut self) -> Result<()> {
        match self.current.take() {
            Some(mut c) => c.close(),
            None => Ok(()),
        }
    }
}

struct OrIndex<S: QuadStore> {
    children: Vec<BoxIndex<S>>,
    matched: Option<usize>,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for OrIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        for (i, idx) in self.children.iter_mut().enumerate() {
            if idx.contains(ctx, candidate)? {
                self.matched = Some(i);
                self.result = Some(candidate.clone());
                return Ok(true);
            }
        }
        self.matched = None;
        self.result = None;
        Ok(false)
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        match self.matched {
            Some(i) => self.children[i].next_path(ctx),
            None => Ok(false),
        }
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let Some(i) = self.matched {
            self.children[i].tag_results(dst);
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.children.iter().find_map(|c| c.err())
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        for c in &mut self.children {
            if let Err(e) = c.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ops::fixed::FixedShape;
    use crate::model::QuadValue;
    use crate::store::MemoryStore;

    fn node(store: &MemoryStore, name: &str) -> <MemoryStore as QuadStore>::Ref {
        store.intern(QuadValue::Iri(name.to_string()))
    }

    #[test]
    fn eager_scan_visits_every_child_even_with_overlap() {
        let store = Arc::new(MemoryStore::new());
        let a = node(&store, "a");
        let b = node(&store, "b");
        let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b])));
        let right = Arc::new(Shape::Fixed(FixedShape::new(vec![b])));
        let shape = OrShape { children: vec![left, right], short_circuit: false };
        let mut scanner = shape.scanner(store.clone());
        let ctx = Context::background();
        let mut seen = Vec::new();
        while scanner.next(&ctx).unwrap() {
            seen.push(store.key(&scanner.result().unwrap()));
        }
        assert_eq!(seen, vec![store.key(&a), store.key(&b), store.key(&b)]);
    }

    #[test]
    fn short_circuit_skips_later_children_once_the_first_yields() {
        let store = Arc::new(MemoryStore::new());
        let a = node(&store, "a");
        let b = node(&store, "b");
        let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let right = Arc::new(Shape::Fixed(FixedShape::new(vec![b])));
        let shape = OrShape { children: vec![left, right], short_circuit: true };
        let mut scanner = shape.scanner(store.clone());
        let ctx = Context::background();
        let mut seen = Vec::new();
        while scanner.next(&ctx).unwrap() {
            seen.push(store.key(&scanner.result().unwrap()));
        }
        assert_eq!(seen, vec![store.key(&a)]);
    }

    #[test]
    fn short_circuit_falls_through_when_the_first_child_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let b = node(&store, "b");
        let left = Arc::new(Shape::Null(crate::engine::ops::null::NullShape));
        let right = Arc::new(Shape::Fixed(FixedShape::new(vec![b])));
        let shape = OrShape { children: vec![left, right], short_circuit: true };
        let mut scanner = shape.scanner(store.clone());
        let ctx = Context::background();
        assert!(scanner.next(&ctx).unwrap());
        assert_eq!(store.key(&scanner.result().unwrap()), store.key(&b));
    }

    #[test]
    fn lookup_matches_if_any_child_matches() {
        let store = Arc::new(MemoryStore::new());
        let a = node(&store, "a");
        let left = Arc::new(Shape::Null(crate::engine::ops::null::NullShape));
        let right = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let shape = OrShape { children: vec![left, right], short_circuit: false };
        let mut index = shape.index(store.clone());
        let ctx = Context::background();
        assert!(index.contains(&ctx, &a).unwrap());
    }
}
