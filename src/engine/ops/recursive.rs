use crate::common::Result;
use crate::context::Context;
use crate::engine::ops::fixed::FixedShape;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::collections::HashSet;
use std::sync::Arc;

/// One hop of a `Recursive` traversal: given a `Shape` whose scan yields
/// the current frontier, returns a `Shape` whose scan yields the next
/// one. Typically a `LinksTo`/`HasA` pair over a fixed predicate.
pub type Morphism<S> = Arc<dyn Fn(Arc<Shape<S>>) -> Arc<Shape<S>> + Send + Sync>;

/// Least fixed point of `X = seed ∪ morphism(X)`, yielding each value
/// discovered via at least one hop exactly once; the seed values
/// themselves are never results. `depth == 0` means unbounded, otherwise
/// traversal stops after that many hops.
#[derive(Clone)]
pub struct RecursiveShape<S: QuadStore> {
    pub seed: Arc<Shape<S>>,
    pub morphism: Morphism<S>,
    pub max_depth: i64,
}

impl<S: QuadStore> RecursiveShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let seed = self.seed.stats(store);
        Costs::new(
            seed.next_cost * crate::model::FANOUT_FACTOR,
            seed.contains_cost * crate::model::FANOUT_FACTOR,
            Size::estimate(seed.size.value * crate::model::FANOUT_FACTOR),
        )
    }

    fn fixed_point(&self, ctx: &Context, store: &StoreHandle<S>) -> Result<Vec<(S::Ref, Vec<S::Ref>)>> {
        let mut seed_scanner = self.seed.scanner(store.clone());
        let mut seed_keys = HashSet::new();
        let mut frontier: Vec<Vec<S::Ref>> = Vec::new();
        while seed_scanner.next(ctx)? {
            let r = seed_scanner.result().expect("next() returned true");
            seed_keys.insert(store.key(&r));
            frontier.push(vec![r]);
        }
        let seed_err = seed_scanner.err().cloned();
        seed_scanner.close()?;
        if let Some(e) = seed_err {
            return Err(e);
        }

        let mut visited = seed_keys;
        let mut results = Vec::new();
        let mut depth = 0i64;
        while !frontier.is_empty() && (self.max_depth == 0 || depth < self.max_depth) {
            if let Err(e) = ctx.check() {
                return Err(e);
            }
            let mut next_frontier = Vec::new();
            for path in &frontier {
                let node = path.last().expect("nonempty path").clone();
                let step = (self.morphism)(Arc::new(Shape::Fixed(FixedShape { values: vec![node] })));
                let mut scanner = step.scanner(store.clone());
                while scanner.next(ctx)? {
                    let v = scanner.result().expect("next() returned true");
                    let key = store.key(&v);
                    if visited.insert(key) {
                        let mut new_path = path.clone();
                        new_path.push(v.clone());
                        results.push((v.clone(), new_path.clone()));
                        next_frontier.push(new_path);
                    }
                }
                let step_err = scanner.err().cloned();
                scanner.close()?;
                if let Some(e) = step_err {
                    return Err(e);
                }
            }
            frontier = next_frontier;
            depth += 1;
        }
        Ok(results)
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(RecursiveScanner {
            store,
            shape: self.clone(),
            results: None,
            cursor: 0,
            err: None,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(RecursiveIndex {
            store,
            shape: self.clone(),
            results: None,
            current: None,
            err: None,
        })
    }
}

struct RecursiveScanner<S: QuadStore> {
    store: StoreHandle<S>,
    shape: RecursiveShape<S>,
    results: Option<Vec<(S::Ref, Vec<S::Ref>)>>,
    cursor: usize,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Scanner<S> for RecursiveScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if self.results.is_none() {
            match self.shape.fixed_point(ctx, &self.store) {
                Ok(results) => self.results = Some(results),
                Err(e) => {
                    self.err = Some(e);
                    return Ok(false);
                }
            }
        }
        let results = self.results.as_ref().expect("just populated");
        if self.cursor >= results.len() {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }

    fn result(&self) -> Option<S::Ref> {
        self.results
            .as_ref()
            .and_then(|r| r.get(self.cursor.checked_sub(1)?))
            .map(|(v, _)| v.clone())
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let (Some(results), Some(idx)) = (&self.results, self.cursor.checked_sub(1)) {
            if let Some((_, path)) = results.get(idx) {
                if let Some(predecessor) = path.len().checked_sub(2).and_then(|i| path.get(i)) {
                    dst.insert("recursive_predecessor".to_string(), predecessor.clone());
                }
            }
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct RecursiveIndex<S: QuadStore> {
    store: StoreHandle<S>,
    shape: RecursiveShape<S>,
    results: Option<Vec<(S::Ref, Vec<S::Ref>)>>,
    current: Option<usize>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Index<S> for RecursiveIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if self.results.is_none() {
            match self.shape.fixed_point(ctx, &self.store) {
                Ok(results) => self.results = Some(results),
                Err(e) => {
                    self.err = Some(e);
                    return Ok(false);
                }
            }
        }
        let key = self.store.key(candidate);
        let results = self.results.as_ref().expect("just populated");
        self.current = results.iter().position(|(v, _)| self.store.key(v) == key);
        Ok(self.current.is_some())
    }

    fn result(&self) -> Option<S::Ref> {
        let idx = self.current?;
        self.results.as_ref()?.get(idx).map(|(v, _)| v.clone())
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let (Some(results), Some(idx)) = (&self.results, self.current) {
            if let Some((_, path)) = results.get(idx) {
                if let Some(predecessor) = path.len().checked_sub(2).and_then(|i| path.get(i)) {
                    dst.insert("recursive_predecessor".to_string(), predecessor.clone());
                }
            }
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
