use crate::common::Result;
use crate::context::Context;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;

/// An explicit finite set of refs, yielded in insertion order. Small-n is
/// the assumed regime: `Index::contains` does a linear
/// scan of a precomputed key array rather than building a hash set.
#[derive(Clone, Debug)]
pub struct FixedShape<R> {
    pub values: Vec<R>,
}

impl<R: Clone> FixedShape<R> {
    pub fn new(values: Vec<R>) -> Self {
        Self { values }
    }

    pub fn stats(&self) -> Costs {
        Costs::new(1, 1, Size::exact(self.values.len() as i64))
    }

    pub fn scanner<S: QuadStore<Ref = R>>(&self, _store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(FixedScanner {
            values: self.values.clone(),
            cursor: 0,
        })
    }

    pub fn index<S: QuadStore<Ref = R>>(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        let keys = self.values.iter().map(|r| store.key(r)).collect();
        Box::new(FixedIndex {
            store,
            values: self.values.clone(),
            keys,
            current: None,
        })
    }
}

struct FixedScanner<R> {
    values: Vec<R>,
    cursor: usize,
}

impl<S: QuadStore> Scanner<S> for FixedScanner<S::Ref> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        ctx.check()?;
        if self.cursor < self.values.len() {
            self.cursor += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn result(&self) -> Option<S::Ref> {
        (self.cursor > 0 && self.cursor <= self.values.len())
            .then(|| self.values[self.cursor - 1].clone())
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&crate::common::Error> {
        None
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct FixedIndex<S: QuadStore> {
    store: StoreHandle<S>,
    values: Vec<S::Ref>,
    keys: Vec<S::Key>,
    current: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for FixedIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        ctx.check()?;
        // Linear scan over the precomputed key array: `Fixed` assumes
        // small-n, so this beats building a hash set per index.
        let candidate_key = self.store.key(candidate);
        for (value, key) in self.values.iter().zip(&self.keys) {
            if key == &candidate_key {
                self.current = Some(value.clone());
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.clone()
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, _dst: &mut TagMap<S::Ref>) {}

    fn err(&self) -> Option<&crate::common::Error> {
        None
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
