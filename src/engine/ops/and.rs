use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Intersection. `required` is ordered, non-empty, and
/// already reordered by the optimizer so `required[0]` is the cheapest
/// primary scanner and the rest form an ascending-`contains_cost` check
/// list; `and.rs` itself just executes whatever order it's given.
/// `optional` children never veto a match; they're tested only to record
/// which ones matched, for tagging.
#[derive(Clone)]
pub struct AndShape<S: QuadStore> {
    pub required: Vec<Arc<Shape<S>>>,
    pub optional: Vec<Arc<Shape<S>>>,
}

impl<S: QuadStore> AndShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        let mut size = self.required[0].stats(store).size;
        let mut next_cost = self.required[0].stats(store).next_cost;
        let contains_sum: i64 = self.required[1..]
            .iter()
            .map(|c| c.stats(store).contains_cost)
            .sum();
        for child in &self.required[1..] {
            size = size.min(child.stats(store).size);
        }
        next_cost += contains_sum;
        Costs::new(next_cost, contains_sum.max(1), size)
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        let primary = self.required[0].scanner(store.clone());
        let secondary = self.required[1..]
            .iter()
            .map(|c| c.index(store.clone()))
            .collect();
        let optional = self.optional.iter().map(|c| c.index(store.clone())).collect::<Vec<_>>();
        let matched_optional = vec![false; optional.len()];
        Box::new(AndScanner {
            primary,
            secondary,
            optional,
            matched_optional,
            last_success: None,
            current: None,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        let required = self.required.iter().map(|c| c.index(store.clone())).collect();
        let optional = self.optional.iter().map(|c| c.index(store.clone())).collect::<Vec<_>>();
        let matched_optional = vec![false; optional.len()];
        Box::new(AndIndex {
            required,
            optional,
            matched_optional,
            current: None,
        })
    }
}

struct AndScanner<S: QuadStore> {
    primary: BoxScanner<S>,
    secondary: Vec<BoxIndex<S>>,
    optional: Vec<BoxIndex<S>>,
    matched_optional: Vec<bool>,
    last_success: Option<S::Ref>,
    current: Option<S::Ref>,
}

impl<S: QuadStore> Scanner<S> for AndScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        loop {
            if !self.primary.next(ctx)? {
                self.current = None;
                return Ok(false);
            }
            let candidate = self.primary.result().expect("next() returned true");
            let mut failed_at = None;
            for (i, idx) in self.secondary.iter_mut().enumerate() {
                if !idx.contains(ctx, &candidate)? {
                    failed_at = Some(i);
                    break;
                }
            }
            if let Some(i) = failed_at {
                if let Some(prev) = self.last_success.clone() {
                    for idx in &mut self.secondary[..i] {
                        let _ = idx.contains(ctx, &prev)?;
                    }
                }
                continue;
            }
            for (i, opt) in self.optional.iter_mut().enumerate() {
                self.matched_optional[i] = opt.contains(ctx, &candidate)?;
            }
            self.current = Some(candidate.clone());
            self.last_success = Some(candidate);
            return Ok(true);
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        if self.primary.next_path(ctx)? {
            return Ok(true);
        }
        for idx in &mut self.secondary {
            if idx.next_path(ctx)? {
                return Ok(true);
            }
        }
        for (i, opt) in self.optional.iter_mut().enumerate() {
            if self.matched_optional[i] && opt.next_path(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.primary.tag_results(dst);
        for idx in &self.secondary {
            idx.tag_results(dst);
        }
        for (i, opt) in self.optional.iter().enumerate() {
            if self.matched_optional[i] {
                opt.tag_results(dst);
            }
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.primary
            .err()
            .or_else(|| self.secondary.iter().find_map(|s| s.err()))
            .or_else(|| self.optional.iter().find_map(|o| o.err()))
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Err(e) = self.primary.close() {
            first_err.get_or_insert(e);
        }
        for idx in &mut self.secondary {
            if let Err(e) = idx.close() {
                first_err.get_or_insert(e);
            }
        }
        for opt in &mut self.optional {
            if let Err(e) = opt.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct AndIndex<S: QuadStore> {
    required: Vec<BoxIndex<S>>,
    optional: Vec<BoxIndex<S>>,
    matched_optional: Vec<bool>,
    current: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for AndIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        for idx in &mut self.required {
            if !idx.contains(ctx, candidate)? {
                self.current = None;
                return Ok(false);
            }
        }
        for (i, opt) in self.optional.iter_mut().enumerate() {
            self.matched_optional[i] = opt.contains(ctx, candidate)?;
        }
        self.current = Some(candidate.clone());
        Ok(true)
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        for idx in &mut self.required {
            if idx.next_path(ctx)? {
                return Ok(true);
            }
        }
        for (i, opt) in self.optional.iter_mut().enumerate() {
            if self.matched_optional[i] && opt.next_path(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        for idx in &self.required {
            idx.tag_results(dst);
        }
        for (i, opt) in self.optional.iter().enumerate() {
            if self.matched_optional[i] {
                opt.tag_results(dst);
            }
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.required
            .iter()
            .find_map(|s| s.err())
            .or_else(|| self.optional.iter().find_map(|o| o.err()))
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        for idx in &mut self.required {
            if let Err(e) = idx.close() {
                first_err.get_or_insert(e);
            }
        }
        for opt in &mut self.optional {
            if let Err(e) = opt.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
