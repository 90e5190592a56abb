//! Scenario tests combining several operators into the kind of plan tree
//! the optimizer actually produces, exercising cross-operator invariants
//! rather than any single operator in isolation.

use crate::context::Context;
use crate::engine::ops::and::AndShape;
use crate::engine::ops::comparison::{CompareOp, ComparisonShape};
use crate::engine::ops::count::CountShape;
use crate::engine::ops::fixed::FixedShape;
use crate::engine::ops::hasa::HasAShape;
use crate::engine::ops::linksto::LinksToShape;
use crate::engine::ops::not::NotShape;
use crate::engine::ops::or::OrShape;
use crate::engine::ops::recursive::RecursiveShape;
use crate::engine::ops::save::SaveShape;
use crate::engine::ops::window::{LimitShape, SkipShape};
use crate::engine::{optimize, Shape};
use crate::model::{Direction, QuadValue};
use crate::store::{MemoryStore, QuadStore, RefKind};
use crate::tag::TagMap;
use std::sync::Arc;
use std::time::Duration;

type Ref = <MemoryStore as QuadStore>::Ref;

fn node(store: &MemoryStore, name: &str) -> Ref {
    store.intern(QuadValue::Iri(name.to_string()))
}

// alice knows bob and carol; bob knows dave. Used by every test below that
// needs a small but non-trivial social graph.
fn social_graph() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_triple(QuadValue::Iri("alice".to_string()), QuadValue::Iri("knows".to_string()), QuadValue::Iri("bob".to_string()));
    store.add_triple(QuadValue::Iri("alice".to_string()), QuadValue::Iri("knows".to_string()), QuadValue::Iri("carol".to_string()));
    store.add_triple(QuadValue::Iri("bob".to_string()), QuadValue::Iri("knows".to_string()), QuadValue::Iri("dave".to_string()));
    store
}

fn scan_names(store: &MemoryStore, shape: &Shape<MemoryStore>, store_handle: Arc<MemoryStore>) -> Vec<QuadValue> {
    let mut scanner = shape.scanner(store_handle);
    let ctx = Context::background();
    let mut out = Vec::new();
    while scanner.next(&ctx).unwrap() {
        out.push(store.name_of(&scanner.result().unwrap()).unwrap());
    }
    scanner.close().unwrap();
    out
}

#[test]
fn and_intersects_two_fixed_sets() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let c = node(&store, "c");
    let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b])));
    let right = Arc::new(Shape::Fixed(FixedShape::new(vec![b, c])));
    let shape = Shape::And(AndShape { required: vec![left, right], optional: vec![] });
    let names = scan_names(&store, &shape, store.clone());
    assert_eq!(names, vec![QuadValue::Iri("b".to_string())]);
}

#[test]
fn eager_or_unions_with_duplicates_short_circuit_stops_at_the_first_nonempty_child() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a])));
    let right = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b])));

    let eager = Shape::Or(OrShape { children: vec![left.clone(), right.clone()], short_circuit: false });
    let eager_names = scan_names(&store, &eager, store.clone());
    assert_eq!(eager_names, vec![QuadValue::Iri("a".to_string()), QuadValue::Iri("a".to_string()), QuadValue::Iri("b".to_string())]);

    let lazy = Shape::Or(OrShape { children: vec![left, right], short_circuit: true });
    let lazy_names = scan_names(&store, &lazy, store.clone());
    assert_eq!(lazy_names, vec![QuadValue::Iri("a".to_string())]);
}

#[test]
fn not_complements_against_an_explicit_universe() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let c = node(&store, "c");
    let universe = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b, c])));
    let child = Arc::new(Shape::Fixed(FixedShape::new(vec![b])));
    let shape = Shape::Not(NotShape { child, universe });
    let names = scan_names(&store, &shape, store.clone());
    assert_eq!(names, vec![QuadValue::Iri("a".to_string()), QuadValue::Iri("c".to_string())]);
}

#[test]
fn limit_and_skip_compose_like_a_page_window() {
    let store = Arc::new(MemoryStore::new());
    let shape = Shape::All(crate::engine::ops::all::AllShape { kind: RefKind::Node, min: 0, max: 9 });
    let skipped = Shape::Skip(SkipShape { child: Arc::new(shape), k: 3 });
    let windowed = Shape::Limit(LimitShape { child: Arc::new(skipped), n: 2 });
    let mut scanner = windowed.scanner(store.clone());
    let ctx = Context::background();
    let mut ids = Vec::new();
    while scanner.next(&ctx).unwrap() {
        ids.push(store.numeric_id(&scanner.result().unwrap()).unwrap());
    }
    assert_eq!(ids, vec![3, 4]);
}

#[test]
fn friends_of_friends_traverses_the_knows_relation_two_hops() {
    let store = Arc::new(social_graph());
    let alice = store.value_of(&QuadValue::Iri("alice".to_string())).unwrap();
    let knows = store.value_of(&QuadValue::Iri("knows".to_string())).unwrap();

    let seed = Arc::new(Shape::Fixed(FixedShape::new(vec![alice])));
    let morphism: crate::engine::ops::recursive::Morphism<MemoryStore> = Arc::new(move |frontier| {
        let via_knows = Arc::new(Shape::And(AndShape {
            required: vec![
                Arc::new(Shape::LinksTo(LinksToShape { primary: frontier, dir: Direction::Subject })),
                Arc::new(Shape::LinksTo(LinksToShape {
                    primary: Arc::new(Shape::Fixed(FixedShape::new(vec![knows]))),
                    dir: Direction::Predicate,
                })),
            ],
            optional: vec![],
        }));
        Arc::new(Shape::HasA(HasAShape { primary: via_knows, dir: Direction::Object }))
    });
    let shape = Shape::Recursive(RecursiveShape { seed, morphism, max_depth: 2 });
    let names = scan_names(&store, &shape, store.clone());
    assert_eq!(
        names,
        vec![
            QuadValue::Iri("bob".to_string()),
            QuadValue::Iri("carol".to_string()),
            QuadValue::Iri("dave".to_string()),
        ]
    );
}

#[test]
fn count_reports_the_cardinality_of_an_and() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let c = node(&store, "c");
    let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b, c])));
    let right = Arc::new(Shape::Fixed(FixedShape::new(vec![b, c])));
    let and = Arc::new(Shape::And(AndShape { required: vec![left, right], optional: vec![] }));
    let shape = Shape::Count(CountShape { child: and });
    let mut scanner = shape.scanner(store.clone());
    let ctx = Context::background();
    assert!(scanner.next(&ctx).unwrap());
    let count = scanner.result().unwrap();
    assert_eq!(store.numeric_id(&count).unwrap(), 2);
}

#[test]
fn comparison_filters_an_and_of_candidates_down_to_those_past_a_threshold() {
    let store = Arc::new(MemoryStore::new());
    let young = store.intern(QuadValue::Int(25));
    let exact = store.intern(QuadValue::Int(30));
    let old = store.intern(QuadValue::Int(40));

    let candidates = Arc::new(Shape::Fixed(FixedShape::new(vec![young, exact, old])));
    let shortlist = Arc::new(Shape::Fixed(FixedShape::new(vec![exact, old])));
    let narrowed = Arc::new(Shape::And(AndShape { required: vec![candidates, shortlist], optional: vec![] }));
    let shape = Shape::Comparison(ComparisonShape { child: narrowed, op: CompareOp::Ge, operand: QuadValue::Int(30) });

    let names = scan_names(&store, &shape, store.clone());
    assert_eq!(names, vec![QuadValue::Int(30), QuadValue::Int(40)]);
}

#[test]
fn tags_survive_nested_save_under_and_outer_wins_on_collision() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let inner = Arc::new(Shape::Save(SaveShape {
        child: Arc::new(Shape::Fixed(FixedShape::new(vec![a]))),
        string_tags: vec!["who".to_string()],
        fixed_tags: vec![],
    }));
    let outer = Shape::Save(SaveShape {
        child: inner,
        string_tags: vec![],
        fixed_tags: vec![crate::tag::FixedTag { name: "who".to_string(), value: b }],
    });
    let mut scanner = outer.scanner(store.clone());
    let ctx = Context::background();
    assert!(scanner.next(&ctx).unwrap());
    let mut tags: TagMap<Ref> = TagMap::new();
    scanner.tag_results(&mut tags);
    // The inner Save writes "who" -> a first (the current result); the
    // outer Save's fixed tag then overwrites it with b.
    assert_eq!(store.key(tags.get("who").unwrap()), store.key(&b));
}

#[test]
fn tags_from_an_ands_optional_child_fold_into_the_outer_tag_map() {
    let store = Arc::new(MemoryStore::new());
    let v = store.intern(QuadValue::Int(234));

    let required = Arc::new(Shape::Save(SaveShape {
        child: Arc::new(Shape::Fixed(FixedShape::new(vec![v]))),
        string_tags: vec!["foo".to_string()],
        fixed_tags: vec![],
    }));
    let optional = Arc::new(Shape::Save(SaveShape {
        child: Arc::new(Shape::Fixed(FixedShape::new(vec![v]))),
        string_tags: vec!["baz".to_string()],
        fixed_tags: vec![],
    }));
    let and = Arc::new(Shape::And(AndShape { required: vec![required], optional: vec![optional] }));
    let shape = Shape::Save(SaveShape { child: and, string_tags: vec!["bar".to_string()], fixed_tags: vec![] });

    let mut scanner = shape.scanner(store.clone());
    let ctx = Context::background();
    assert!(scanner.next(&ctx).unwrap());
    let mut tags: TagMap<Ref> = TagMap::new();
    scanner.tag_results(&mut tags);

    for name in ["bar", "foo", "baz"] {
        assert_eq!(store.key(tags.get(name).unwrap()), store.key(&v), "tag {name}");
    }
}

#[test]
fn optimizer_preserves_scan_results_for_an_and_of_fixed_sets() {
    let store = MemoryStore::new();
    let a = node(&store, "a");
    let b = node(&store, "b");
    let c = node(&store, "c");
    let left = Arc::new(Shape::Fixed(FixedShape::new(vec![a, b, c])));
    let right = Arc::new(Shape::Fixed(FixedShape::new(vec![c, b])));
    let raw = Shape::And(AndShape { required: vec![left, right], optional: vec![] });

    let store = Arc::new(store);
    let mut raw_names = scan_names(&store, &raw, store.clone());
    raw_names.sort_by_key(|v| format!("{v}"));

    let optimized = optimize(store.as_ref(), &raw);
    let mut optimized_names = scan_names(&store, &optimized, store.clone());
    optimized_names.sort_by_key(|v| format!("{v}"));

    assert_eq!(raw_names, optimized_names);
}

#[test]
fn scan_and_lookup_agree_on_a_composed_and_or_tree() {
    let store = Arc::new(MemoryStore::new());
    let a = node(&store, "a");
    let b = node(&store, "b");
    let c = node(&store, "c");
    let d = node(&store, "d");
    let left = Arc::new(Shape::Or(OrShape {
        children: vec![
            Arc::new(Shape::Fixed(FixedShape::new(vec![a, b]))),
            Arc::new(Shape::Fixed(FixedShape::new(vec![c]))),
        ],
        short_circuit: false,
    }));
    let right = Arc::new(Shape::Fixed(FixedShape::new(vec![a, c, d])));
    let shape = Shape::And(AndShape { required: vec![left, right], optional: vec![] });

    let mut scanner = shape.scanner(store.clone());
    let ctx = Context::background();
    let mut scanned = Vec::new();
    while scanner.next(&ctx).unwrap() {
        scanned.push(store.key(&scanner.result().unwrap()));
    }

    let mut index = shape.index(store.clone());
    for candidate in [a, b, c, d] {
        let expected = scanned.contains(&store.key(&candidate));
        assert_eq!(index.contains(&ctx, &candidate).unwrap(), expected);
    }
}

#[test]
fn a_cancelled_context_stops_a_scan_in_its_tracks() {
    let store = Arc::new(MemoryStore::new());
    let shape = Shape::All(crate::engine::ops::all::AllShape { kind: RefKind::Node, min: 0, max: 1_000_000 });
    let mut scanner = shape.scanner(store);
    let ctx = Context::background();
    assert!(scanner.next(&ctx).unwrap());
    ctx.cancel();
    assert_eq!(scanner.next(&ctx).unwrap(), false);
    assert!(matches!(scanner.err(), Some(crate::common::Error::Cancelled)));
}

#[test]
fn a_context_with_an_elapsed_deadline_is_already_cancelled() {
    let ctx = Context::with_timeout(Duration::from_millis(0));
    std::thread::sleep(Duration::from_millis(5));
    assert!(ctx.check().is_err());
}

// Builds a random shallow And/Or tree over a small fixed universe of refs
// and returns its sorted scan results.
fn random_shallow_tree<R: rand::Rng>(universe: &[Ref], rng: &mut R) -> Shape<MemoryStore> {
    let pick_subset = |rng: &mut R| -> Arc<Shape<MemoryStore>> {
        let values: Vec<Ref> = universe.iter().filter(|_| rng.gen_bool(0.5)).cloned().collect();
        Arc::new(Shape::Fixed(FixedShape::new(values)))
    };
    let children: Vec<Arc<Shape<MemoryStore>>> = (0..rng.gen_range(2..4)).map(|_| pick_subset(rng)).collect();
    if rng.gen_bool(0.5) {
        Shape::And(AndShape { required: children, optional: vec![] })
    } else {
        Shape::Or(OrShape { children, short_circuit: false })
    }
}

#[test]
fn optimizer_preserves_semantics_across_randomized_shallow_trees() {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    let store = Arc::new(MemoryStore::new());
    let universe: Vec<Ref> = (0..6).map(|i| node(&store, &format!("n{i}"))).collect();

    for seed in 0..20u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let raw = random_shallow_tree(&universe, &mut rng);

        let mut raw_keys: Vec<_> = {
            let mut scanner = raw.scanner(store.clone());
            let ctx = Context::background();
            let mut out = Vec::new();
            while scanner.next(&ctx).unwrap() {
                out.push(store.key(&scanner.result().unwrap()));
            }
            out
        };
        raw_keys.sort();

        let optimized = optimize(store.as_ref(), &raw);
        let mut optimized_keys: Vec<_> = {
            let mut scanner = optimized.scanner(store.clone());
            let ctx = Context::background();
            let mut out = Vec::new();
            while scanner.next(&ctx).unwrap() {
                out.push(store.key(&scanner.result().unwrap()));
            }
            out
        };
        optimized_keys.sort();

        assert_eq!(raw_keys, optimized_keys, "seed {seed} diverged after optimization");
    }
}
