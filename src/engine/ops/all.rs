use crate::common::Result;
use crate::context::Context;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, RefKind, StoreHandle};
use crate::tag::TagMap;

/// The universe of node or link refs over `[min, max]`.
/// This is the reference implementation used by tests; a real deployment
/// asks the store for a bulk all-iterator instead (`QuadStore::
/// nodes_all_iterator`/`quads_all_iterator`), which may be backed by
/// storage rather than a bare numeric range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllShape {
    pub kind: RefKind,
    pub min: i64,
    pub max: i64,
}

impl AllShape {
    pub fn stats(&self) -> Costs {
        let len = (self.max - self.min + 1).max(0);
        Costs::new(1, 1, Size::exact(len))
    }

    pub fn scanner<S: QuadStore>(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(AllScanner {
            store,
            kind: self.kind,
            min: self.min,
            max: self.max,
            cursor: self.min,
            started: false,
            err: None,
        })
    }

    pub fn index<S: QuadStore>(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(AllIndex {
            store,
            min: self.min,
            max: self.max,
            current: None,
            err: None,
        })
    }
}

struct AllScanner<S: QuadStore> {
    store: StoreHandle<S>,
    kind: RefKind,
    min: i64,
    max: i64,
    cursor: i64,
    started: bool,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Scanner<S> for AllScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if let Err(e) = ctx.check() {
            self.err = Some(e);
            return Ok(false);
        }
        if self.started {
            self.cursor += 1;
        }
        self.started = true;
        Ok(self.cursor <= self.max)
    }

    fn result(&self) -> Option<S::Ref> {
        (self.started && self.cursor <= self.max)
            .then(|| self.store.ref_for_id(self.kind, self.cursor))
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

struct AllIndex<S: QuadStore> {
    store: StoreHandle<S>,
    min: i64,
    max: i64,
    current: Option<S::Ref>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Index<S> for AllIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        if let Err(e) = ctx.check() {
            self.err = Some(e);
            return Ok(false);
        }
        let Some(id) = self.store.numeric_id(candidate) else {
            self.current = None;
            return Ok(false);
        };
        if id >= self.min && id <= self.max {
            self.current = Some(candidate.clone());
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

    fn err(&self) -> Option<&crate::common::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
