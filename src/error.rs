//! Error types for arbor.

use thiserror::Error;

use crate::planner::LogicalPlan;

/// Result type alias using [`ArborError`].
pub type Result<T> = std::result::Result<T, ArborError>;

/// Error types for type conversion, expression evaluation and plan analysis.
#[derive(Debug, Error)]
pub enum ArborError {
    // ==================== Type System Errors ====================
    /// A value has no conversion path to the target type.
    #[error("Invalid type: value {value} can't be converted to {target}")]
    InvalidType { value: String, target: String },

    /// A numeric conversion would lose magnitude.
    #[error("Overflow: value {value} overflows {target}")]
    Overflow { value: String, target: String },

    /// The cast registry holds no entry for the ordered type pair.
    #[error("Type cast does not exist from {from} to {to}")]
    NoSuchCast { from: String, to: String },

    /// A value's tag does not match the type operating on it.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    // ==================== Expression Errors ====================
    /// Type or value requested from an expression that is not resolved yet.
    #[error("Unresolved expression: {0}")]
    UnresolvedExpression(String),

    /// Expression used in a context it does not support.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    // ==================== Catalog Errors ====================
    /// Database or table registration errors.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Function registration or construction errors.
    #[error("Function error: {0}")]
    FunctionError(String),

    // ==================== Analyzer Errors ====================
    /// Analysis converged but the plan still holds an unresolved node.
    #[error("Plan is not resolved: {}", .0.describe())]
    UnresolvedPlan(Box<LogicalPlan>),

    /// The fixed-point search did not converge within the pass ceiling.
    #[error("Exceeded max analysis iterations ({limit})")]
    AnalysisIterationLimitExceeded {
        limit: usize,
        /// Last computed tree; not resolved.
        plan: Box<LogicalPlan>,
    },
}
