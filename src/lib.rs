//! arbor - logical query core
//!
//! Resolves unresolved logical plans against a catalog with a fixed-point
//! rule analyzer, on top of an immutable expression model and a scalar type
//! system with an explicit cast registry.

pub mod analyzer;
pub mod catalog;
pub mod error;
pub mod expression;
pub mod planner;
pub mod types;

pub use analyzer::{Analyzer, AnalyzerConfig, AnalyzerRule};
pub use catalog::Catalog;
pub use error::{ArborError, Result};
pub use expression::Expression;
pub use planner::LogicalPlan;
pub use types::{Row, Type, Value};
