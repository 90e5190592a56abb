use crate::engine::ops::all::AllShape;
use crate::engine::ops::and::AndShape;
use crate::engine::ops::comparison::ComparisonShape;
use crate::engine::ops::count::CountShape;
use crate::engine::ops::fixed::FixedShape;
use crate::engine::ops::hasa::HasAShape;
use crate::engine::ops::linksto::LinksToShape;
use crate::engine::ops::materialize::MaterializeShape;
use crate::engine::ops::not::NotShape;
use crate::engine::ops::null::NullShape;
use crate::engine::ops::optional::OptionalShape;
use crate::engine::ops::or::OrShape;
use crate::engine::ops::recursive::RecursiveShape;
use crate::engine::ops::resolver::ResolverShape;
use crate::engine::ops::save::SaveShape;
use crate::engine::ops::unique::UniqueShape;
use crate::engine::ops::window::{LimitShape, SkipShape};
use crate::engine::store_leaf::StoreLeaf;
use crate::engine::{BoxIndex, BoxScanner};
use crate::model::Costs;
use crate::store::{QuadStore, StoreHandle};

/// A logical query plan node: one variant per operator in the inventory.
/// A `Shape` is immutable and cheaply shared — children
/// are held behind `Arc` so the optimizer can rewrite a subtree once and
/// have every parent that references it see the replacement without a
/// deep copy, and so many independent `Scanner`/`Index` pairs can be
/// built from the same optimized tree.
#[derive(Clone)]
pub enum Shape<S: QuadStore> {
    Null(NullShape),
    All(AllShape),
    Fixed(FixedShape<S::Ref>),
    Resolver(ResolverShape),
    Save(SaveShape<S>),
    HasA(HasAShape<S>),
    LinksTo(LinksToShape<S>),
    And(AndShape<S>),
    Or(OrShape<S>),
    Not(NotShape<S>),
    Optional(OptionalShape<S>),
    Comparison(ComparisonShape<S>),
    Count(CountShape<S>),
    Limit(LimitShape<S>),
    Skip(SkipShape<S>),
    Unique(UniqueShape<S>),
    Materialize(MaterializeShape<S>),
    Recursive(RecursiveShape<S>),
    /// A store-provided leaf the core has no dedicated variant for.
    /// `Box<dyn StoreLeaf<S>>` is `Clone` via `dyn_clone` so `Shape`
    /// itself stays cheaply cloneable.
    Store(Box<dyn StoreLeaf<S>>),
}

impl<S: QuadStore> Shape<S> {
    /// Estimated `(next_cost, contains_cost, size)` for this subtree, used
    /// by the optimizer's reordering and `Materialize`-insertion rules.
    pub fn stats(&self, store: &S) -> Costs {
        match self {
            Shape::Null(n) => n.stats(),
            Shape::All(a) => a.stats(),
            Shape::Fixed(f) => f.stats(),
            Shape::Resolver(r) => r.stats(),
            Shape::Save(s) => s.stats(store),
            Shape::HasA(h) => h.stats(store),
            Shape::LinksTo(l) => l.stats(store),
            Shape::And(a) => a.stats(store),
            Shape::Or(o) => o.stats(store),
            Shape::Not(n) => n.stats(store),
            Shape::Optional(o) => o.stats(store),
            Shape::Comparison(c) => c.stats(store),
            Shape::Count(c) => c.stats(store),
            Shape::Limit(l) => l.stats(store),
            Shape::Skip(s) => s.stats(store),
            Shape::Unique(u) => u.stats(store),
            Shape::Materialize(m) => m.stats(store),
            Shape::Recursive(r) => r.stats(store),
            Shape::Store(leaf) => leaf.stats(store),
        }
    }

    /// Builds a fresh scan-mode handle bound to `store`.
    pub fn scanner(&self, store: StoreHandle<S>) -> BoxScanner<S> {
        match self {
            Shape::Null(n) => n.scanner(store),
            Shape::All(a) => a.scanner(store),
            Shape::Fixed(f) => f.scanner(store),
            Shape::Resolver(r) => r.scanner(store),
            Shape::Save(s) => s.scanner(store),
            Shape::HasA(h) => h.scanner(store),
            Shape::LinksTo(l) => l.scanner(store),
            Shape::And(a) => a.scanner(store),
            Shape::Or(o) => o.scanner(store),
            Shape::Not(n) => n.scanner(store),
            Shape::Optional(o) => o.scanner(store),
            Shape::Comparison(c) => c.scanner(store),
            Shape::Count(c) => c.scanner(store),
            Shape::Limit(l) => l.scanner(store),
            Shape::Skip(s) => s.scanner(store),
            Shape::Unique(u) => u.scanner(store),
            Shape::Materialize(m) => m.scanner(store),
            Shape::Recursive(r) => r.scanner(store),
            Shape::Store(leaf) => leaf.scanner(store),
        }
    }

    /// Builds a fresh lookup-mode handle bound to `store`.
    pub fn index(&self, store: StoreHandle<S>) -> BoxIndex<S> {
        match self {
            Shape::Null(n) => n.index(store),
            Shape::All(a) => a.index(store),
            Shape::Fixed(f) => f.index(store),
            Shape::Resolver(r) => r.index(store),
            Shape::Save(s) => s.index(store),
            Shape::HasA(h) => h.index(store),
            Shape::LinksTo(l) => l.index(store),
            Shape::And(a) => a.index(store),
            Shape::Or(o) => o.index(store),
            Shape::Not(n) => n.index(store),
            Shape::Optional(o) => o.index(store),
            Shape::Comparison(c) => c.index(store),
            Shape::Count(c) => c.index(store),
            Shape::Limit(l) => l.index(store),
            Shape::Skip(s) => s.index(store),
            Shape::Unique(u) => u.index(store),
            Shape::Materialize(m) => m.index(store),
            Shape::Recursive(r) => r.index(store),
            Shape::Store(leaf) => leaf.index(store),
        }
    }

    /// This node's immediate children, for plan display and traversal.
    /// Leaves (`Null`, `All`, `Fixed`, `Resolver`, `Store`) return an empty
    /// vec; everything else returns each `Arc<Shape<S>>` field it holds, in
    /// the order it would evaluate them.
    pub fn sub_iterators(&self) -> Vec<Arc<Shape<S>>> {
        match self {
            Shape::Null(_) | Shape::All(_) | Shape::Fixed(_) | Shape::Resolver(_) | Shape::Store(_) => vec![],
            Shape::Save(s) => vec![s.child.clone()],
            Shape::HasA(h) => vec![h.primary.clone()],
            Shape::LinksTo(l) => vec![l.primary.clone()],
            Shape::And(a) => a.required.iter().chain(a.optional.iter()).cloned().collect(),
            Shape::Or(o) => o.children.clone(),
            Shape::Not(n) => vec![n.child.clone(), n.universe.clone()],
            Shape::Optional(o) => vec![o.sub.clone()],
            Shape::Comparison(c) => vec![c.child.clone()],
            Shape::Count(c) => vec![c.child.clone()],
            Shape::Limit(l) => vec![l.child.clone()],
            Shape::Skip(s) => vec![s.child.clone()],
            Shape::Unique(u) => vec![u.child.clone()],
            Shape::Materialize(m) => vec![m.child.clone()],
            Shape::Recursive(r) => vec![r.seed.clone()],
        }
    }

    /// The operator's name, for `Display` and plan-debugging output.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Null(_) => "Null",
            Shape::All(_) => "All",
            Shape::Fixed(_) => "Fixed",
            Shape::Resolver(_) => "Resolver",
            Shape::Save(_) => "Save",
            Shape::HasA(_) => "HasA",
            Shape::LinksTo(_) => "LinksTo",
            Shape::And(_) => "And",
            Shape::Or(_) => "Or",
            Shape::Not(_) => "Not",
            Shape::Optional(_) => "Optional",
            Shape::Comparison(_) => "Comparison",
            Shape::Count(_) => "Count",
            Shape::Limit(_) => "Limit",
            Shape::Skip(_) => "Skip",
            Shape::Unique(_) => "Unique",
            Shape::Materialize(_) => "Materialize",
            Shape::Recursive(_) => "Recursive",
            Shape::Store(leaf) => leaf.name(),
        }
    }
}

impl<S: QuadStore> std::fmt::Display for Shape<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let children = self.sub_iterators();
        if children.is_empty() {
            return write!(f, "{}", self.name());
        }
        write!(f, "{}(", self.name())?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")
    }
}
