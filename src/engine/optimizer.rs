//! Bottom-up rewrite rules applied to an already-built `Shape` tree.
//! `optimize` recurses into children first, then applies the rewrites for
//! the node itself; the store gets a final say via
//! `QuadStore::optimize_iterator` for `HasA`/`LinksTo`.

use crate::engine::ops::and::AndShape;
use crate::engine::ops::materialize::MaterializeShape;
use crate::engine::ops::null::NullShape;
use crate::engine::ops::or::OrShape;
use crate::engine::ops::save::SaveShape;
use crate::engine::ops::window::{LimitShape, SkipShape};
use crate::engine::Shape;
use crate::model::NEXT_CONSTANT;
use crate::store::QuadStore;
use itertools::Itertools;
use std::sync::Arc;

/// Maximum number of nested `Materialize` wrappers the optimizer will
/// introduce on any one path, to prevent cascade buffering.
const MAX_MATERIALIZE_DEPTH: u32 = 10;

/// Optimizes `shape` against `store`, returning the rewritten tree.
pub fn optimize<S: QuadStore>(store: &S, shape: &Shape<S>) -> Shape<S> {
    optimize_at_depth(store, shape, 0)
}

fn optimize_at_depth<S: QuadStore>(store: &S, shape: &Shape<S>, depth: u32) -> Shape<S> {
    match shape {
        Shape::Save(s) => {
            let child = optimize_at_depth(store, &s.child, depth);
            if s.string_tags.is_empty() && s.fixed_tags.is_empty() {
                return child;
            }
            Shape::Save(SaveShape {
                child: Arc::new(child),
                string_tags: s.string_tags.clone(),
                fixed_tags: s.fixed_tags.clone(),
            })
        }
        Shape::And(and) => optimize_and(store, and, depth),
        Shape::Or(or) => {
            let children = or
                .children
                .iter()
                .map(|c| Arc::new(optimize_at_depth(store, c, depth)))
                .collect();
            Shape::Or(OrShape {
                children,
                short_circuit: or.short_circuit,
            })
        }
        Shape::Not(not) => {
            let will_wrap = depth < MAX_MATERIALIZE_DEPTH;
            let child_depth = if will_wrap { depth + 1 } else { depth };
            let child = optimize_at_depth(store, &not.child, child_depth);
            let child = if will_wrap {
                Shape::Materialize(MaterializeShape::new(Arc::new(child)))
            } else {
                child
            };
            Shape::Not(crate::engine::ops::not::NotShape {
                child: Arc::new(child),
                universe: Arc::new(optimize_at_depth(store, &not.universe, depth)),
            })
        }
        Shape::HasA(hasa) => {
            let primary = optimize_at_depth(store, &hasa.primary, depth);
            if matches!(primary, Shape::Null(_)) {
                return Shape::Null(NullShape);
            }
            let rewritten = Shape::HasA(crate::engine::ops::hasa::HasAShape {
                primary: Arc::new(primary),
                dir: hasa.dir,
            });
            let (replacement, changed) = store.optimize_iterator(&rewritten);
            if changed {
                replacement
            } else {
                rewritten
            }
        }
        Shape::LinksTo(linksto) => {
            let primary = optimize_at_depth(store, &linksto.primary, depth);
            if matches!(primary, Shape::Null(_)) {
                return Shape::Null(NullShape);
            }
            let rewritten = Shape::LinksTo(crate::engine::ops::linksto::LinksToShape {
                primary: Arc::new(primary),
                dir: linksto.dir,
            });
            let (replacement, changed) = store.optimize_iterator(&rewritten);
            if changed {
                replacement
            } else {
                rewritten
            }
        }
        Shape::Limit(limit) => {
            let child = optimize_at_depth(store, &limit.child, depth);
            if limit.n == 0 {
                return child;
            }
            Shape::Limit(LimitShape {
                child: Arc::new(child),
                n: limit.n,
            })
        }
        Shape::Skip(skip) => {
            let child = optimize_at_depth(store, &skip.child, depth);
            if skip.k == 0 {
                return child;
            }
            Shape::Skip(SkipShape {
                child: Arc::new(child),
                k: skip.k,
            })
        }
        Shape::Optional(opt) => Shape::Optional(crate::engine::ops::optional::OptionalShape {
            sub: Arc::new(optimize_at_depth(store, &opt.sub, depth)),
        }),
        Shape::Comparison(cmp) => Shape::Comparison(crate::engine::ops::comparison::ComparisonShape {
            child: Arc::new(optimize_at_depth(store, &cmp.child, depth)),
            op: cmp.op,
            operand: cmp.operand.clone(),
        }),
        Shape::Count(count) => Shape::Count(crate::engine::ops::count::CountShape {
            child: Arc::new(optimize_at_depth(store, &count.child, depth)),
        }),
        Shape::Unique(unique) => Shape::Unique(crate::engine::ops::unique::UniqueShape {
            child: Arc::new(optimize_at_depth(store, &unique.child, depth)),
        }),
        Shape::Materialize(mat) => Shape::Materialize(MaterializeShape::new(Arc::new(
            optimize_at_depth(store, &mat.child, depth + 1),
        ))),
        Shape::Recursive(rec) => Shape::Recursive(crate::engine::ops::recursive::RecursiveShape {
            seed: Arc::new(optimize_at_depth(store, &rec.seed, depth)),
            morphism: rec.morphism.clone(),
            max_depth: rec.max_depth,
        }),
        Shape::Resolver(r) if r.values.is_empty() => Shape::Null(NullShape),
        // Leaves carry no children to recurse into.
        Shape::Null(_) | Shape::All(_) | Shape::Fixed(_) | Shape::Resolver(_) | Shape::Store(_) => {
            shape.clone()
        }
    }
}

/// Wraps `child` in `Materialize` when its stats say buffering beats
/// repeated `contains` calls against it as a secondary of `primary_size`,
/// and the nesting cap hasn't been hit.
fn maybe_materialize<S: QuadStore>(store: &S, child: Shape<S>, primary_size: i64, depth: u32) -> Shape<S> {
    if depth >= MAX_MATERIALIZE_DEPTH {
        return child;
    }
    let stats = child.stats(store);
    let size = stats.size.value.max(0);
    let buffer_cost = size.saturating_mul(stats.next_cost);
    let probe_cost = stats.contains_cost.saturating_mul(1 + primary_size / (size + 1));
    if buffer_cost < probe_cost {
        Shape::Materialize(MaterializeShape::new(Arc::new(child)))
    } else {
        child
    }
}

fn optimize_and<S: QuadStore>(store: &S, and: &AndShape<S>, depth: u32) -> Shape<S> {
    let required: Vec<Shape<S>> = and
        .required
        .iter()
        .map(|c| optimize_at_depth(store, c, depth))
        .collect();
    let optional: Vec<Arc<Shape<S>>> = and
        .optional
        .iter()
        .map(|c| Arc::new(optimize_at_depth(store, c, depth)))
        .collect();

    if required.is_empty() {
        return Shape::Null(NullShape);
    }
    if required.len() == 1 && optional.is_empty() {
        return required.into_iter().next().expect("len == 1");
    }
    if required.iter().any(|c| matches!(c, Shape::Null(_))) {
        return Shape::Null(NullShape);
    }

    let is_useful = |c: &Shape<S>| !matches!(c, Shape::All(_) | Shape::Null(_) | Shape::Optional(_));
    let useful_count = required.iter().filter(|c| is_useful(c)).count();
    if useful_count == 1 && optional.is_empty() {
        let idx = required.iter().position(|c| is_useful(c)).expect("useful_count == 1");
        return required.into_iter().nth(idx).expect("valid index");
    }

    let stats: Vec<_> = required.iter().map(|c| c.stats(store)).collect();
    let primary_idx = (0..required.len())
        .min_by_key(|&i| {
            let size_i = stats[i].size.value.max(1);
            let contains_sum: i64 = (0..required.len())
                .filter(|&j| j != i)
                .map(|j| {
                    let size_j = stats[j].size.value.max(0);
                    stats[j].contains_cost.saturating_mul(1 + size_i / (size_j + 1))
                })
                .sum();
            size_i.saturating_mul(stats[i].next_cost.saturating_mul(NEXT_CONSTANT) + contains_sum)
        })
        .unwrap_or(0);
    let primary_size = stats[primary_idx].size.value;

    let mut slots: Vec<Option<Shape<S>>> = required.into_iter().map(Some).collect();
    let primary = slots[primary_idx].take().expect("primary present");

    // Ascending by contains_cost for fast failure, with non-nextable
    // shapes (Optional, Not) pushed past every nextable one regardless
    // of their cost.
    let rest_idx: Vec<usize> = (0..slots.len())
        .filter(|&i| i != primary_idx)
        .sorted_by_key(|&i| {
            let tail = matches!(slots[i].as_ref().expect("not taken"), Shape::Not(_) | Shape::Optional(_));
            (tail, stats[i].contains_cost)
        })
        .collect();

    let rest: Vec<Arc<Shape<S>>> = rest_idx
        .into_iter()
        .map(|i| {
            let child = slots[i].take().expect("not taken twice");
            Arc::new(maybe_materialize(store, child, primary_size, depth))
        })
        .collect();

    let mut new_required = Vec::with_capacity(rest.len() + 1);
    new_required.push(Arc::new(primary));
    new_required.extend(rest);

    Shape::And(AndShape {
        required: new_required,
        optional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ops::all::AllShape;
    use crate::engine::ops::fixed::FixedShape;
    use crate::engine::ops::not::NotShape;
    use crate::engine::ops::save::SaveShape;
    use crate::engine::ops::window::{LimitShape, SkipShape};
    use crate::model::QuadValue;
    use crate::store::{MemoryStore, RefKind};

    fn node(store: &MemoryStore, name: &str) -> <MemoryStore as QuadStore>::Ref {
        store.intern(QuadValue::Iri(name.to_string()))
    }

    #[test]
    fn save_with_no_tags_unwraps_to_its_child() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::Save(SaveShape {
            child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))),
            string_tags: vec![],
            fixed_tags: vec![],
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Fixed(_)));
    }

    #[test]
    fn save_with_tags_survives() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::Save(SaveShape {
            child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))),
            string_tags: vec!["x".to_string()],
            fixed_tags: vec![],
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Save(_)));
    }

    #[test]
    fn and_with_no_required_children_collapses_to_null() {
        let store = MemoryStore::new();
        let shape = Shape::And(AndShape { required: vec![], optional: vec![] });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Null(_)));
    }

    #[test]
    fn and_with_a_null_required_child_collapses_to_null() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::And(AndShape {
            required: vec![
                Arc::new(Shape::Fixed(FixedShape::new(vec![a]))),
                Arc::new(Shape::Null(NullShape)),
            ],
            optional: vec![],
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Null(_)));
    }

    #[test]
    fn and_with_a_single_required_child_and_no_optionals_unwraps() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::And(AndShape {
            required: vec![Arc::new(Shape::Fixed(FixedShape::new(vec![a])))],
            optional: vec![],
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Fixed(_)));
    }

    #[test]
    fn and_ignores_all_and_optional_children_when_judging_usefulness() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let fixed = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let all = Arc::new(Shape::All(AllShape { kind: RefKind::Node, min: 0, max: 100 }));
        let shape = Shape::And(AndShape {
            required: vec![fixed, all],
            optional: vec![],
        });
        let optimized = optimize(&store, &shape);
        // Only one required child is "useful" (not All/Null/Optional), so
        // the And unwraps to just that child.
        assert!(matches!(optimized, Shape::Fixed(_)));
    }

    #[test]
    fn and_with_two_useful_children_picks_a_cheap_primary_and_keeps_both() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let b = node(&store, "b");
        let small = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let large = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b])));
        let shape = Shape::And(AndShape { required: vec![large, small], optional: vec![] });
        let optimized = optimize(&store, &shape);
        match optimized {
            Shape::And(and) => {
                assert_eq!(and.required.len(), 2);
                // The cheaper (smaller) child should have been chosen as
                // the primary, i.e. moved to the front.
                assert!(matches!(*and.required[0], Shape::Fixed(ref f) if f.stats().size.value == 1));
            }
            other => panic!("expected And, got {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn not_and_optional_children_are_pushed_to_the_end_of_the_check_order() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let universe = Arc::new(Shape::All(AllShape { kind: RefKind::Node, min: 0, max: 10 }));
        let required = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let not = Arc::new(Shape::Not(NotShape { child: required.clone(), universe: universe.clone() }));
        let other = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
        let shape = Shape::And(AndShape { required: vec![not, other], optional: vec![] });
        let optimized = optimize(&store, &shape);
        match optimized {
            Shape::And(and) => {
                assert!(!matches!(*and.required[0], Shape::Not(_)));
                assert!(matches!(*and.required[and.required.len() - 1], Shape::Not(_)));
            }
            other => panic!("expected And, got {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn limit_zero_unwraps_to_its_child() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::Limit(LimitShape { child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))), n: 0 });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Fixed(_)));
    }

    #[test]
    fn skip_zero_unwraps_to_its_child() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let shape = Shape::Skip(SkipShape { child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))), k: 0 });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Fixed(_)));
    }

    #[test]
    fn not_wraps_its_child_in_materialize() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let universe = Arc::new(Shape::All(AllShape { kind: RefKind::Node, min: 0, max: 10 }));
        let shape = Shape::Not(NotShape {
            child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))),
            universe,
        });
        let optimized = optimize(&store, &shape);
        match optimized {
            Shape::Not(not) => assert!(matches!(*not.child, Shape::Materialize(_))),
            other => panic!("expected Not, got {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn hasa_over_a_null_primary_collapses_to_null() {
        let store = MemoryStore::new();
        let shape = Shape::HasA(crate::engine::ops::hasa::HasAShape {
            primary: Arc::new(Shape::Null(NullShape)),
            dir: crate::model::Direction::Object,
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Null(_)));
    }

    #[test]
    fn linksto_over_a_null_primary_collapses_to_null() {
        let store = MemoryStore::new();
        let shape = Shape::LinksTo(crate::engine::ops::linksto::LinksToShape {
            primary: Arc::new(Shape::Null(NullShape)),
            dir: crate::model::Direction::Subject,
        });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Null(_)));
    }

    #[test]
    fn resolver_with_an_empty_value_list_collapses_to_null() {
        let store = MemoryStore::new();
        let shape = Shape::Resolver(crate::engine::ops::resolver::ResolverShape { values: vec![] });
        let optimized = optimize(&store, &shape);
        assert!(matches!(optimized, Shape::Null(_)));
    }

    #[test]
    fn nested_not_chains_cap_the_number_of_inserted_materializes() {
        let store = MemoryStore::new();
        let a = node(&store, "a");
        let universe = Arc::new(Shape::All(AllShape { kind: RefKind::Node, min: 0, max: 10 }));
        let mut shape = Shape::Fixed(FixedShape::new(vec![a]));
        for _ in 0..(MAX_MATERIALIZE_DEPTH as usize + 2) {
            shape = Shape::Not(NotShape { child: Arc::new(shape), universe: universe.clone() });
        }
        let optimized = optimize(&store, &shape);

        let mut materialize_count = 0u32;
        let mut current = optimized;
        loop {
            current = match current {
                Shape::Not(not) => (*not.child).clone(),
                Shape::Materialize(mat) => {
                    materialize_count += 1;
                    (*mat.child).clone()
                }
                _ => break,
            };
        }
        assert!(
            materialize_count <= MAX_MATERIALIZE_DEPTH,
            "expected at most {MAX_MATERIALIZE_DEPTH} inserted materializes, got {materialize_count}"
        );
    }
}
