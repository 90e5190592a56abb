//! One module per operator in the inventory. Each exposes
//! a `*Shape` logical-parameters type plus private `scanner`/`index`
//! handle types; `engine::shape::Shape` ties them into one enum.

pub mod all;
pub mod and;
pub mod comparison;
pub mod count;
pub mod fixed;
pub mod hasa;
pub mod linksto;
pub mod materialize;
pub mod not;
pub mod null;
pub mod optional;
pub mod or;
pub mod recursive;
pub mod resolver;
pub mod save;
pub mod unique;
pub mod window;
