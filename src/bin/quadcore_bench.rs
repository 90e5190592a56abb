//! Manual-inspection binary: builds a synthetic graph, runs a handful of
//! representative query shapes against it through both the optimizer and
//! the raw tree, and logs result counts and wall-clock cost so a developer
//! can eyeball whether the optimizer is actually doing anything useful.

use log::info;
use quadcore::common::Result;
use quadcore::context::Context;
use quadcore::engine::ops::and::AndShape;
use quadcore::engine::ops::hasa::HasAShape;
use quadcore::engine::ops::linksto::LinksToShape;
use quadcore::engine::{optimize, Shape};
use quadcore::model::{Direction, QuadValue};
use quadcore::store::MemoryStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Instant;

const NODE_COUNT: usize = 2_000;
const EDGES_PER_NODE: usize = 6;

fn main() -> Result<()> {
    env_logger::init();
    let config = quadcore::config::OptimizerConfig::load().unwrap_or_default();
    info!(
        "loaded optimizer config: fanout_factor={} materialize_max_depth={}",
        config.fanout_factor, config.materialize_max_depth
    );

    let store = Arc::new(build_synthetic_store());
    info!("built synthetic store with {NODE_COUNT} nodes");

    let ctx = Context::background();
    let shape = friends_of_friends(&store);

    let started = Instant::now();
    let raw_count = run_scan(&ctx, &store, &shape)?;
    let raw_elapsed = started.elapsed();

    let optimized = optimize(store.as_ref(), &shape);
    let started = Instant::now();
    let optimized_count = run_scan(&ctx, &store, &optimized)?;
    let optimized_elapsed = started.elapsed();

    info!("raw plan: {raw_count} results in {raw_elapsed:?}");
    info!("optimized plan ({optimized}): {optimized_count} results in {optimized_elapsed:?}");

    Ok(())
}

fn friends_of_friends(store: &Arc<MemoryStore>) -> Shape<MemoryStore> {
    let knows = store.intern(QuadValue::Iri("knows".to_string()));
    let seed = store.intern(QuadValue::Iri("node-0".to_string()));

    // One hop: links whose subject is the current node and whose predicate
    // is "knows", projected down to the object node.
    let hop = move |node: Arc<Shape<MemoryStore>>| -> Arc<Shape<MemoryStore>> {
        let by_subject = Shape::LinksTo(LinksToShape { primary: node, dir: Direction::Subject });
        let by_predicate = Shape::LinksTo(LinksToShape {
            primary: Arc::new(Shape::Fixed(quadcore::engine::ops::fixed::FixedShape::new(vec![knows]))),
            dir: Direction::Predicate,
        });
        let links = Shape::And(AndShape {
            required: vec![Arc::new(by_subject), Arc::new(by_predicate)],
            optional: vec![],
        });
        Arc::new(Shape::HasA(HasAShape { primary: Arc::new(links), dir: Direction::Object }))
    };

    let seed_shape = Arc::new(Shape::Fixed(quadcore::engine::ops::fixed::FixedShape::new(vec![seed])));
    Shape::Recursive(quadcore::engine::ops::recursive::RecursiveShape {
        seed: seed_shape,
        morphism: Arc::new(hop),
        max_depth: 2,
    })
}

fn run_scan(ctx: &Context, store: &Arc<MemoryStore>, shape: &Shape<MemoryStore>) -> Result<usize> {
    let mut scanner = shape.scanner(store.clone());
    let mut count = 0usize;
    while scanner.next(ctx)? {
        count += 1;
    }
    scanner.close()?;
    Ok(count)
}

fn build_synthetic_store() -> MemoryStore {
    use rand::Rng;

    let store = MemoryStore::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let nodes: Vec<QuadValue> = (0..NODE_COUNT)
        .map(|i| QuadValue::Iri(format!("node-{i}")))
        .collect();

    for (i, node) in nodes.iter().enumerate() {
        for _ in 0..EDGES_PER_NODE {
            let target = &nodes[rng.gen_range(0..NODE_COUNT)];
            if target != node {
                store.add_triple(node.clone(), QuadValue::Iri("knows".to_string()), target.clone());
            }
        }
    }
    store
}
