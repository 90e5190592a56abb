//! The tagging protocol: named bindings propagated from leaves to the
//! root as a side effect of evaluation.

use std::collections::HashMap;

/// The binding map filled in by `tag_results`. Keyed by tag name; duplicate
/// tags are overwritten by the outermost writer, matching `Save`'s contract.
pub type TagMap<R> = HashMap<String, R>;

/// A fixed tag → value pair attached by `Save` independent of the current
/// result.
#[derive(Clone, Debug)]
pub struct FixedTag<R> {
    pub name: String,
    pub value: R,
}

/// Capability implemented by any Scanner/Index that can absorb additional
/// tags without a wrapping `Save` node — used by the optimizer to fuse a
/// `Save` into any child that also implements this capability.
pub trait Tagger<R> {
    /// Adds a string tag: at each result, write the current result under
    /// this name.
    fn add_string_tag(&mut self, name: String);
    /// Adds a fixed tag: at each result, write `value` under this name
    /// regardless of what the current result is.
    fn add_fixed_tag(&mut self, name: String, value: R);
}
