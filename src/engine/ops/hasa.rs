use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Direction};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;
use std::sync::Arc;

/// Projects link refs to node refs along `dir`.
#[derive(Clone)]
pub struct HasAShape<S: QuadStore> {
    pub primary: Arc<Shape<S>>,
    pub dir: Direction,
}

impl<S: QuadStore> HasAShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        // Same cardinality as the primary: one node emitted per link, so
        // the same node may appear repeatedly.
        let primary = self.primary.stats(store);
        Costs::new(primary.next_cost + 1, primary.contains_cost + 1, primary.size)
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(HasAScanner {
            dir: self.dir,
            store: store.clone(),
            primary: self.primary.scanner(store),
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(HasAIndex {
            dir: self.dir,
            store,
            primary: self.primary.clone(),
            link_iter: None,
            primary_index: None,
            matched_link: None,
            result: None,
        })
    }
}

struct HasAScanner<S: QuadStore> {
    dir: Direction,
    store: StoreHandle<S>,
    primary: BoxScanner<S>,
}

impl<S: QuadStore> Scanner<S> for HasAScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        self.primary.next(ctx)
    }

    fn result(&self) -> Option<S::Ref> {
        let link = self.primary.result()?;
        self.store.quad_direction(&link, self.dir)
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.primary.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.primary.tag_results(dst)
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.primary.err()
    }

    fn close(&mut self) -> Result<()> {
        self.primary.close()
    }
}

/// Lookup-mode state for `HasA`: on `contains(v)`, scans the store's
/// per-`v` link iterator asking `primary`'s lookup whether each candidate
/// link is in its relation. `next_path` first asks `primary` for an
/// alternate derivation of the currently matched link, then — once that's
/// exhausted — resumes scanning the link iterator for a *different*
/// matching link.
struct HasAIndex<S: QuadStore> {
    dir: Direction,
    store: StoreHandle<S>,
    primary: Arc<Shape<S>>,
    link_iter: Option<BoxScanner<S>>,
    primary_index: Option<BoxIndex<S>>,
    matched_link: Option<S::Ref>,
    result: Option<S::Ref>,
}

impl<S: QuadStore> Index<S> for HasAIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        ctx.check()?;
        let mut link_iter = self
            .store
            .quad_iterator(self.dir, candidate)
            .scanner(self.store.clone());
        let mut primary_index = self.primary.index(self.store.clone());
        loop {
            if !link_iter.next(ctx)? {
                self.link_iter = None;
                self.primary_index = None;
                self.matched_link = None;
                self.result = None;
                return Ok(false);
            }
            let link = link_iter.result().expect("next() returned true");
            if primary_index.contains(ctx, &link)? {
                self.matched_link = Some(link);
                self.result = Some(candidate.clone());
                self.link_iter = Some(link_iter);
                self.primary_index = Some(primary_index);
                return Ok(true);
            }
        }
    }

    fn result(&self) -> Option<S::Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        if let Some(primary_index) = &mut self.primary_index {
            if primary_index.next_path(ctx)? {
                return Ok(true);
            }
        }
        let (Some(link_iter), Some(primary_index)) =
            (&mut self.link_iter, &mut self.primary_index)
        else {
            return Ok(false);
        };
        while link_iter.next(ctx)? {
            let link = link_iter.result().expect("next() returned true");
            if primary_index.contains(ctx, &link)? {
                self.matched_link = Some(link);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        if let Some(primary_index) = &self.primary_index {
            primary_index.tag_results(dst);
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.primary_index.as_ref().and_then(|i| i.err())
    }

    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Some(mut iter) = self.link_iter.take() {
            if let Err(e) = iter.close() {
                first_err.get_or_insert(e);
            }
        }
        if let Some(mut idx) = self.primary_index.take() {
            if let Err(e) = idx.close() {
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

    #[test]
    fn scan_projects_each_link_to_its_object() {
        let store = Arc::new(MemoryStore::new());
        let link = store.add_triple(
            QuadValue::Iri("alice".to_string()),
            QuadValue::Iri("knows".to_string()),
            QuadValue::Iri("bob".to_string()),
        );
        let bob = store.value_of(&QuadValue::Iri("bob".to_string())).unwrap();
        let primary = Arc::new(Shape::Fixed(FixedShape::new(vec![link])));
        let shape = HasAShape { primary, dir: Direction::Object };
        let mut scanner = shape.scanner(store.clone());
        let ctx = Context::background();
        assert!(scanner.next(&ctx).unwrap());
        assert_eq!(store.key(&scanner.result().unwrap()), store.key(&bob));
        assert_eq!(scanner.next(&ctx).unwrap(), false);
    }

    #[test]
    fn lookup_finds_a_link_whose_subject_matches() {
        let store = Arc::new(MemoryStore::new());
        let link = store.add_triple(
            QuadValue::Iri("alice".to_string()),
            QuadValue::Iri("knows".to_string()),
            QuadValue::Iri("bob".to_string()),
        );
        let alice = store.value_of(&QuadValue::Iri("alice".to_string())).unwrap();
        let primary = Arc::new(Shape::Fixed(FixedShape::new(vec![link])));
        let shape = HasAShape { primary, dir: Direction::Subject };
        let mut index = shape.index(store.clone());
        let ctx = Context::background();
        assert!(index.contains(&ctx, &alice).unwrap());
    }

    #[test]
    fn lookup_rejects_a_node_with_no_matching_link() {
        let store = Arc::new(MemoryStore::new());
        let link = store.add_triple(
            QuadValue::Iri("alice".to_string()),
            QuadValue::Iri("knows".to_string()),
            QuadValue::Iri("bob".to_string()),
        );
        let carol = store.intern(QuadValue::Iri("carol".to_string()));
        let primary = Arc::new(Shape::Fixed(FixedShape::new(vec![link])));
        let shape = HasAShape { primary, dir: Direction::Subject };
        let mut index = shape.index(store.clone());
        let ctx = Context::background();
        assert!(!index.contains(&ctx, &carol).unwrap());
    }
}
