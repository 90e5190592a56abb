use crate::common::{Error, Result};
use crate::context::Context;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, QuadValue, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::cell::OnceCell;

/// Resolves a list of quad values to refs on first use.
/// Resolution happens once, lazily, on the first `next`/`contains` call,
/// via a single batched `QuadStore::refs_of`, and is cached for the
/// lifetime of the handle.
#[derive(Clone, Debug)]
pub struct ResolverShape {
    pub values: Vec<QuadValue>,
}

impl ResolverShape {
    pub fn stats(&self) -> Costs {
        Costs::new(1, 1, Size::estimate(self.values.len() as i64))
    }

    pub fn scanner<S: QuadStore>(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(ResolverHandle::new(store, self.values.clone()))
    }

    pub fn index<S: QuadStore>(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(ResolverHandle::new(store, self.values.clone()))
    }
}

struct ResolverHandle<S: QuadStore> {
    store: StoreHandle<S>,
    values: Vec<QuadValue>,
    resolved: OnceCell<Vec<S::Ref>>,
    cursor: usize,
    current: Option<S::Ref>,
    err: Option<Error>,
}

impl<S: QuadStore> ResolverHandle<S> {
    fn new(store: StoreHandle<S>, values: Vec<QuadValue>) -> Self {
        Self {
            store,
            values,
            resolved: OnceCell::new(),
            cursor: 0,
            current: None,
            err: None,
        }
    }

    fn resolve(&mut self, ctx: &Context) -> Result<&Vec<S::Ref>> {
        if self.resolved.get().is_none() {
            let result = (|| -> Result<Vec<S::Ref>> {
                let refs = self.store.refs_of(ctx, &self.values)?;
                let mut out = Vec::with_capacity(refs.len());
                for (value, r) in self.values.iter().zip(refs) {
                    match r {
                        Some(r) => out.push(r),
                        None => crate::not_found!("{value}"),
                    }
                }
                Ok(out)
            })();
            match result {
                Ok(out) => {
                    let _ = self.resolved.set(out);
                }
                Err(err) => {
                    self.err.get_or_insert(err.clone());
                    return Err(err);
                }
            }
        }
        Ok(self.resolved.get().unwrap())
    }
}

impl<S: QuadStore> Scanner<S> for ResolverHandle<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if let Err(e) = ctx.check() {
            self.err.get_or_insert(e);
            return Ok(false);
        }
        let len = match self.resolve(ctx) {
            Ok(refs) => refs.len(),
            Err(_) => return Ok(false),
        };
        if self.cursor < len {
            self.current = self.resolved.get().map(|refs| refs[self.cursor].clone());
            self.cursor += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.clone()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: QuadStore> Index<S> for ResolverHandle<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if let Err(e) = ctx.check() {
            self.err.get_or_insert(e);
            return Ok(false);
        }
        let candidate_key = self.store.key(candidate);
        let found = match self.resolve(ctx) {
            Ok(refs) => refs.iter().any(|r| self.store.key(r) == candidate_key),
            Err(_) => false,
        };
        self.current = found.then(|| candidate.clone());
        Ok(found)
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.clone()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
