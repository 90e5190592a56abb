use crate::common::Result;
use crate::context::Context;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::{Costs, Size};
use crate::store::{QuadStore, StoreHandle};
use crate::tag::TagMap;

/// The empty relation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullShape;

impl NullShape {
    pub fn stats(&self) -> Costs {
        Costs::new(0, 0, Size::ZERO)
    }

    pub fn scanner<S: QuadStore>(&self, _store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(NullScanner)
    }

    pub fn index<S: QuadStore>(&self, _store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(NullScanner)
    }
}

struct NullScanner;

impl<S: QuadStore> Scanner<S> for NullScanner {
    fn next(&mut self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }
    fn result(&self) -> Option<S::Ref> {
        None
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

impl<S: QuadStore> Index<S> for NullScanner {
    fn contains(&mut self, _ctx: &Context, _candidate: &S::Ref) -> Result<bool> {
        Ok(false)
    }
    fn result(&self) -> Option<S::Ref> {
        None
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn scan_yields_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut scanner = NullShape.scanner(store);
        assert_eq!(scanner.next(&Context::background()).unwrap(), false);
        assert_eq!(scanner.result(), None);
    }

    #[test]
    fn lookup_rejects_every_candidate() {
        let store = Arc::new(MemoryStore::new());
        let node = store.intern(crate::model::QuadValue::Iri("a".to_string()));
        let mut index = NullShape.index(store);
        assert_eq!(index.contains(&Context::background(), &node).unwrap(), false);
    }

    #[test]
    fn stats_are_zero() {
        let stats = NullShape.stats();
        assert_eq!(stats.size.value, 0);
        assert!(stats.size.exact);
    }
}
