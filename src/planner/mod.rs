//! Logical query plans.
//!
//! Plans enter the analyzer unresolved (table and column names, function
//! calls, unbound casts) and leave it fully bound against the catalog.

pub mod logical_plan;

pub use logical_plan::{LogicalPlan, SortExpr};
