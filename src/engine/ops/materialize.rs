use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

type Buffer<S> = Vec<(<S as QuadStore>::Ref, TagMap<<S as QuadStore>::Ref>)>;

/// Buffers all of `child`'s results the first time either a scan or a
/// lookup demands one, then serves every later scan/lookup from that
/// buffer. The `OnceCell` is shared across every `Scanner`/`Index`
/// built from this shape (and across clones of it, via the `Arc`), so
/// sibling operators reading the same `Materialize` node only pay the
/// underlying scan cost once. The optimizer decides when to insert this
/// wrapper and caps nesting depth at 10 to prevent cascade buffering.
#[derive(Clone)]
pub struct MaterializeShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    buffer: Arc<OnceCell<Buffer<S>>>,
}

impl<S: QuadStore> MaterializeShape<S> {
    pub fn new(child: Arc<Shape<S>>) -> Self {
        Self {
            child,
            buffer: Arc::new(OnceCell::new()),
        }
    }

    pub fn stats(&self, store: &S) -> Costs {
        match self.buffer.get() {
            Some(buf) => Costs::new(1, 1, Size::exact(buf.len() as i64)),
            None => {
                let child = self.child.stats(store);
                Costs::new(child.next_cost, child.contains_cost, child.size)
            }
        }
    }

    fn ensure(&self, ctx: &Context, store: &StoreHandle<S>) -> Result<&Buffer<S>> {
        self.buffer.get_or_try_init(|| {
            let mut scanner = self.child.scanner(store.clone());
            let mut out = Vec::new();
            while scanner.next(ctx)? {
                let r = scanner.result().expect("next() returned true");
                let mut tags = TagMap::new();
                scanner.tag_results(&mut tags);
                out.push((r, tags));
            }
            let err = scanner.err().cloned();
            scanner.close()?;
            match err {
                Some(e) => Err(e),
                None => Ok(out),
            }
        })
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(MaterializeScanner {
            store,
            shape: self.clone(),
            cursor: 0,
            current: None,
            err: None,
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(MaterializeIndex {
            store,
            shape: self.clone(),
            current: None,
            err: None,
        })
    }
}

struct MaterializeScanner<S: QuadStore> {
    store: StoreHandle<S>,
    shape: MaterializeShape<S>,
    cursor: usize,
    current: Option<(S::Ref, TagMap<S::Ref>)>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Scanner<S> for MaterializeScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        let buf = match self.shape.ensure(ctx, &self.store) {
            Ok(buf) => buf,
            Err(e) => {
                self.err = Some(e);
                return Ok(false);
            }
        };
        if self.cursor >= buf.len() {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(buf[self.cursor].clone());
        self.cursor += 1;
        Ok(true)
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.as_ref().map(|(r, _)| r.clone())
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let Some((_, tags)) = &self.current {
            for (k, v) in tags {
                dst.insert(k.clone(), v.clone());
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

struct MaterializeIndex<S: QuadStore> {
    store: StoreHandle<S>,
    shape: MaterializeShape<S>,
    current: Option<(S::Ref, TagMap<S::Ref>)>,
    err: Option<crate::common::Error>,
}

impl<S: QuadStore> Index<S> for MaterializeIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        if self.err.is_some() {
            return Ok(false);
        }
        let key = self.store.key(candidate);
        let buf = match self.shape.ensure(ctx, &self.store) {
            Ok(buf) => buf,
            Err(e) => {
                self.err = Some(e);
                return Ok(false);
            }
        };
        match buf.iter().find(|(r, _)| self.store.key(r) == key) {
            Some(entry) => {
                self.current = Some(entry.clone());
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.current.as_ref().map(|(r, _)| r.clone())
    }

    fn next_path(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let Some((_, tags)) = &self.current {
            for (k, v) in tags {
                dst.insert(k.clone(), v.clone());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ops::fixed::FixedShape;
    use crate::model::QuadValue;
    use crate::store::MemoryStore;

    #[test]
    fn scan_and_lookup_observe_the_same_buffered_results() {
        let store = Arc::new(MemoryStore::new());
        let a = store.intern(QuadValue::Iri("a".to_string()));
        let b = store.intern(QuadValue::Iri("b".to_string()));
        let child = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b])));
        let shape = MaterializeShape::new(child);

        let mut index = shape.index(store.clone());
        let ctx = Context::background();
        assert!(index.contains(&ctx, &b).unwrap());

        let mut scanner = shape.scanner(store.clone());
        let mut seen = Vec::new();
        while scanner.next(&ctx).unwrap() {
            seen.push(store.key(&scanner.result().unwrap()));
        }
        assert_eq!(seen, vec![store.key(&a), store.key(&b)]);
    }

    #[test]
    fn stats_report_exact_size_once_buffered() {
        let store = Arc::new(MemoryStore::new());
        let a = store.intern(QuadValue::Iri("a".to_string()));
        let child = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let shape = MaterializeShape::new(child);
        let ctx = Context::background();
        let mut scanner = shape.scanner(store.clone());
        while scanner.next(&ctx).unwrap() {}
        let stats = shape.stats(store.as_ref());
        assert_eq!(stats.size.value, 1);
        assert!(stats.size.exact);
    }

    #[test]
    fn a_cancelled_context_reports_false_and_stores_the_error() {
        let store = Arc::new(MemoryStore::new());
        let a = store.intern(QuadValue::Iri("a".to_string()));
        let child = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let shape = MaterializeShape::new(child);
        let mut scanner = shape.scanner(store);
        let ctx = Context::background();
        ctx.cancel();
        assert_eq!(scanner.next(&ctx).unwrap(), false);
        assert!(matches!(scanner.err(), Some(crate::common::Error::Cancelled)));
    }
}
