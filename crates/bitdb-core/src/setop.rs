//! Binary set operations expressed as word-level functions.

use std::fmt;

/// One of the four binary set operations over equal-universe vectors.
///
/// Each variant is a pure function on a pair of packed words. Because all
/// four map `(0, 0)` to `0`, applying them word-by-word never sets a
/// padding bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// `a | b`
    Union,
    /// `a & b`
    Intersect,
    /// `a & !b`
    Difference,
    /// `a ^ b`
    SymmetricDifference,
}

impl SetOp {
    /// All operations, in discriminant order.
    pub const ALL: [SetOp; 4] = [
        SetOp::Union,
        SetOp::Intersect,
        SetOp::Difference,
        SetOp::SymmetricDifference,
    ];

    /// Apply the operation to one pair of words.
    #[inline]
    pub fn apply(self, a: u64, b: u64) -> u64 {
        match self {
            Self::Union => a | b,
            Self::Intersect => a & b,
            Self::Difference => a & !b,
            Self::SymmetricDifference => a ^ b,
        }
    }

    /// Whether `a OP b == b OP a` for all inputs.
    pub fn is_commutative(self) -> bool {
        !matches!(self, Self::Difference)
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Difference => "difference",
            Self::SymmetricDifference => "symmetric_difference",
        };
        f.write_str(name)
    }
}
