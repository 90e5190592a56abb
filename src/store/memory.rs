//! `MemoryStore`: the reference `QuadStore` used by tests and the
//! benchmark binary. Holds everything in two `Vec`s
//! (nodes, quads) plus per-direction adjacency indexes; not meant for
//! production scale, just to exercise the evaluation core against a
//! real implementation of the contract.

use super::{QuadStore, RefKind};
use crate::common::Result;
use crate::context::Context;
use crate::engine::Shape;
use crate::engine::ops::all::AllShape;
use crate::engine::ops::fixed::FixedShape;
use crate::model::{Direction, Quad, QuadValue};
use std::collections::HashMap;
use std::sync::RwLock;

/// A ref into a `MemoryStore`: either a node (position `subject`/
/// `predicate`/`object`/`label` can hold) or a link (a whole quad).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ref {
    Node(i64),
    Link(i64),
}

#[derive(Default)]
struct Inner {
    nodes: Vec<QuadValue>,
    node_index: HashMap<QuadValue, i64>,
    quads: Vec<Quad<Ref>>,
    // by_dir[dir as usize][node_id] -> link ids whose `dir` projection is node_id
    by_dir: [HashMap<i64, Vec<i64>>; 4],
}

/// An in-memory, single-process `QuadStore`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Interns `value`, returning its node ref (creating a fresh node if
    /// the value hasn't been seen before).
    pub fn intern(&self, value: QuadValue) -> Ref {
        let mut inner = self.inner.write().expect("lock poisoned");
        if let Some(&id) = inner.node_index.get(&value) {
            return Ref::Node(id);
        }
        let id = inner.nodes.len() as i64;
        inner.node_index.insert(value.clone(), id);
        inner.nodes.push(value);
        Ref::Node(id)
    }

    /// Adds a full quad, interning each of the four values, and returns
    /// its link ref.
    pub fn add_quad(&self, subject: QuadValue, predicate: QuadValue, object: QuadValue, label: QuadValue) -> Ref {
        let subject = self.intern(subject);
        let predicate = self.intern(predicate);
        let object = self.intern(object);
        let label = self.intern(label);
        let quad = Quad {
            subject,
            predicate,
            object,
            label,
        };

        let mut inner = self.inner.write().expect("lock poisoned");
        let link_id = inner.quads.len() as i64;
        for dir in Direction::ALL {
            if let Ref::Node(node_id) = quad.direction(dir) {
                inner.by_dir[dir as usize].entry(node_id).or_default().push(link_id);
            }
        }
        inner.quads.push(quad);
        Ref::Link(link_id)
    }

    /// Adds a triple under the default graph, a convenience for test
    /// fixtures that don't care about named graphs.
    pub fn add_triple(&self, subject: QuadValue, predicate: QuadValue, object: QuadValue) -> Ref {
        self.add_quad(subject, predicate, object, QuadValue::Iri("default_graph".to_string()))
    }
}

impl QuadStore for MemoryStore {
    type Ref = Ref;
    type Key = Ref;

    fn key(&self, r: &Ref) -> Ref {
        *r
    }

    fn value_of(&self, value: &QuadValue) -> Option<Ref> {
        let inner = self.inner.read().expect("lock poisoned");
        inner.node_index.get(value).map(|&id| Ref::Node(id))
    }

    fn name_of(&self, r: &Ref) -> Option<QuadValue> {
        let inner = self.inner.read().expect("lock poisoned");
        match r {
            Ref::Node(id) => inner.nodes.get(*id as usize).cloned(),
            Ref::Link(_) => None,
        }
    }

    fn quad(&self, r: &Ref) -> Option<Quad<Ref>> {
        let inner = self.inner.read().expect("lock poisoned");
        match r {
            Ref::Link(id) => inner.quads.get(*id as usize).cloned(),
            Ref::Node(_) => None,
        }
    }

    fn quad_direction(&self, link: &Ref, dir: Direction) -> Option<Ref> {
        self.quad(link).map(|q| q.direction(dir))
    }

    fn quad_iterator(&self, dir: Direction, r: &Ref) -> Shape<Self> {
        let Ref::Node(node_id) = r else {
            return Shape::Null(crate::engine::ops::null::NullShape);
        };
        let inner = self.inner.read().expect("lock poisoned");
        let values = inner
            .by_dir[dir as usize]
            .get(node_id)
            .map(|links| links.iter().map(|&id| Ref::Link(id)).collect())
            .unwrap_or_default();
        Shape::Fixed(FixedShape::new(values))
    }

    fn nodes_all_iterator(&self) -> Shape<Self> {
        let inner = self.inner.read().expect("lock poisoned");
        Shape::All(AllShape {
            kind: RefKind::Node,
            min: 0,
            max: (inner.nodes.len() as i64) - 1,
        })
    }

    fn quads_all_iterator(&self) -> Shape<Self> {
        let inner = self.inner.read().expect("lock poisoned");
        Shape::All(AllShape {
            kind: RefKind::Link,
            min: 0,
            max: (inner.quads.len() as i64) - 1,
        })
    }

    fn optimize_iterator(&self, shape: &Shape<Self>) -> (Shape<Self>, bool) {
        (shape.clone(), false)
    }

    fn refs_of(&self, ctx: &Context, values: &[QuadValue]) -> Result<Vec<Option<Ref>>> {
        ctx.check()?;
        Ok(values.iter().map(|v| self.value_of(v)).collect())
    }

    fn fanout(&self, dir: Direction, r: &Ref) -> Option<i64> {
        let Ref::Node(node_id) = r else {
            return Some(0);
        };
        let inner = self.inner.read().expect("lock poisoned");
        Some(inner.by_dir[dir as usize].get(node_id).map_or(0, |v| v.len() as i64))
    }

    fn ref_for_id(&self, kind: RefKind, id: i64) -> Ref {
        match kind {
            RefKind::Node => Ref::Node(id),
            RefKind::Link => Ref::Link(id),
        }
    }

    fn numeric_id(&self, r: &Ref) -> Option<i64> {
        match r {
            Ref::Node(id) | Ref::Link(id) => Some(*id),
        }
    }
}
