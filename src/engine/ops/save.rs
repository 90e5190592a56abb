use crate::common::Result;
use crate::context::Context;
use crate::engine::shape::Shape;
use crate::engine::{BoxIndex, BoxScanner, Index, Scanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};
use crate::tag::{FixedTag, TagMap};
use std::sync::Arc;

/// Attaches named bindings to a child's results. At each
/// result, `tag_results` first delegates to the child, then writes the
/// current result under every string tag, then writes the fixed values —
/// so an outer `Save`'s tags win over an inner one's on name collision.
#[derive(Clone)]
pub struct SaveShape<S: QuadStore> {
    pub child: Arc<Shape<S>>,
    pub string_tags: Vec<String>,
    pub fixed_tags: Vec<FixedTag<S::Ref>>,
}

impl<S: QuadStore> SaveShape<S> {
    pub fn stats(&self, store: &S) -> Costs {
        self.child.stats(store)
    }

    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        Box::new(SaveScanner {
            child: self.child.scanner(store),
            string_tags: self.string_tags.clone(),
            fixed_tags: self.fixed_tags.clone(),
        })
    }

    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        Box::new(SaveIndex {
            child: self.child.index(store),
            string_tags: self.string_tags.clone(),
            fixed_tags: self.fixed_tags.clone(),
        })
    }
}

struct SaveScanner<S: QuadStore> {
    child: BoxScanner<S>,
    string_tags: Vec<String>,
    fixed_tags: Vec<FixedTag<S::Ref>>,
}

impl<S: QuadStore> Scanner<S> for SaveScanner<S> {
    fn next(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next(ctx)
    }

    fn result(&self) -> Option<S::Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.child.tag_results(dst);
        if let Some(current) = self.result() {
            for tag in &self.string_tags {
                dst.insert(tag.clone(), current.clone());
            }
        }
        for tag in &self.fixed_tags {
            dst.insert(tag.name.clone(), tag.value.clone());
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}

struct SaveIndex<S: QuadStore> {
    child: BoxIndex<S>,
    string_tags: Vec<String>,
    fixed_tags: Vec<FixedTag<S::Ref>>,
}

impl<S: QuadStore> Index<S> for SaveIndex<S> {
    fn contains(&mut self, ctx: &Context, candidate: &S::Ref) -> Result<bool> {
        self.child.contains(ctx, candidate)
    }

    fn result(&self) -> Option<S::Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &Context) -> Result<bool> {
        self.child.next_path(ctx)
    }

    fn tag_results(&self, dst: &mut TagMap<S::Ref>) {
        self.child.tag_results(dst);
        if let Some(current) = self.result() {
            for tag in &self.string_tags {
                dst.insert(tag.clone(), current.clone());
            }
        }
        for tag in &self.fixed_tags {
            dst.insert(tag.name.clone(), tag.value.clone());
        }
    }

    fn err(&self) -> Option<&crate::common::Error> {
        self.child.err()
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }
}
