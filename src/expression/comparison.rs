//! Comparison operators.

use std::cmp::Ordering;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equal (=).
    Equals,
    /// Greater than (>).
    GreaterThan,
    /// Less than (<).
    LessThan,
    /// Greater than or equal (>=).
    GreaterThanOrEqual,
    /// Less than or equal (<=).
    LessThanOrEqual,
}

impl ComparisonOp {
    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Equals => "=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::LessThan => "<",
            ComparisonOp::GreaterThanOrEqual => ">=",
            ComparisonOp::LessThanOrEqual => "<=",
        }
    }

    /// Applies the operator to the result of a three-way comparison.
    #[must_use]
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equals => ordering == Ordering::Equal,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}
