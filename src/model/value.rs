use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A concrete quad value: what `Resolver` and `Comparison` operate on,
/// as opposed to the `Ref` layer every other operator works at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum QuadValue {
    Iri(String),
    BlankNode(String),
    String(String),
    Int(i64),
    Float(f64),
    Time(i64),
    Raw(Vec<u8>),
}

impl QuadValue {
    /// A short name for the value's kind, used in `Comparison`'s
    /// kind-mismatch error messages and in plan display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Iri(_) => "iri",
            Self::BlankNode(_) => "blank node",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Time(_) => "time",
            Self::Raw(_) => "raw",
        }
    }

    /// Orders two values of the *same* kind. Returns `None` across kinds
    /// (callers treat a kind mismatch as predicate failure, not a panic;
    /// see `Comparison`).
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Iri(a), Self::Iri(b)) => Some(a.cmp(b)),
            (Self::BlankNode(a), Self::BlankNode(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Raw(a), Self::Raw(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for QuadValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Iri(a), Self::Iri(b)) => a == b,
            (Self::BlankNode(a), Self::BlankNode(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // NaN compares equal to itself here: QuadValue is used as a
            // hash/map-adjacent key for resolution, not for IEEE arithmetic.
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Raw(a), Self::Raw(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for QuadValue {}

impl std::hash::Hash for QuadValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Iri(s) | Self::BlankNode(s) | Self::String(s) => s.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => {
                if f.is_nan() {
                    0u64.hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Self::Time(t) => t.hash(state),
            Self::Raw(b) => b.hash(state),
        }
    }
}

impl std::fmt::Display for QuadValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(s) => write!(f, "<{s}>"),
            Self::BlankNode(s) => write!(f, "_:{s}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Time(t) => write!(f, "@{t}"),
            Self::Raw(b) => write!(f, "raw({} bytes)", b.len()),
        }
    }
}
