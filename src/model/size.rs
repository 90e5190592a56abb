//! Size and cost estimation types.
//!
//! The four coefficients below are heuristic but must stay named constants:
//! regression tests pin specific plan choices (which child becomes the
//! primary of an `And`, when `Materialize` gets inserted) to these exact
//! values, the same way the design notes call out
//! `fanout_factor`/`nextConstant`/`quadConstant`/`uniquenessFactor` as
//! reproducibility-critical. A deployment may retune them via
//! `config::OptimizerConfig` (see `config.rs`), but the defaults here are
//! what the test suite assumes.

/// `LinksTo`'s heuristic multiplier for a non-`Fixed` primary:
/// size(primary) * FANOUT_FACTOR when we can't ask the store for an
/// exact per-node fan-out.
pub const FANOUT_FACTOR: i64 = 20;

/// Relative unit cost of one `next` call versus one `contains` call in the
/// optimizer's primary-selection formula.
pub const NEXT_CONSTANT: i64 = 2;

/// Relative unit cost of resolving one quad projection from the store.
pub const QUAD_CONSTANT: i64 = 1;

/// `Unique`'s cost penalty: deduplication requires buffering seen keys, so
/// its `contains_cost` is its child's `contains_cost` times this factor.
pub const UNIQUENESS_FACTOR: i64 = 2;

/// `(value, exact)`. `exact` is `true` only when `value` is a proven upper
/// bound equal to the actual size — never an optimistic guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub value: i64,
    pub exact: bool,
}

impl Size {
    pub const fn exact(value: i64) -> Self {
        Self { value, exact: true }
    }

    pub const fn estimate(value: i64) -> Self {
        Self {
            value,
            exact: false,
        }
    }

    /// The size of `Null`: zero, and provably so.
    pub const ZERO: Size = Size::exact(0);

    pub fn min(self, other: Size) -> Size {
        Size {
            value: self.value.min(other.value),
            exact: self.exact && other.exact,
        }
    }

    pub fn add(self, other: Size) -> Size {
        Size {
            value: self.value.saturating_add(other.value),
            exact: self.exact && other.exact,
        }
    }

    pub fn scale(self, factor: i64, exact: bool) -> Size {
        Size {
            value: self.value.saturating_mul(factor),
            exact: self.exact && exact,
        }
    }
}

/// `(next_cost, contains_cost, size)`. Units are relative, not time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Costs {
    pub next_cost: i64,
    pub contains_cost: i64,
    pub size: Size,
}

impl Costs {
    pub const fn new(next_cost: i64, contains_cost: i64, size: Size) -> Self {
        Self {
            next_cost,
            contains_cost,
            size,
        }
    }
}
