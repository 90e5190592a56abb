#![crate_type = "lib"]
#![crate_name = "quadcore"]

//! A store-agnostic query-evaluation core for graph/quad-shaped data:
//! a `Shape` plan tree, dual-mode `Scanner`/`Index` evaluation, and a
//! cost-based bottom-up optimizer, all generic over a `QuadStore`
//! implementation.

pub mod common;
pub mod config;
pub mod context;
pub mod engine;
pub mod model;
pub mod store;
pub mod tag;
