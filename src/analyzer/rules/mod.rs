//! Resolution rules applied by the analyzer.
//!
//! Every rule is a pure rewrite of the plan tree. Rules never fail: when a
//! lookup does not succeed the node is left as it was, and the analyzer's
//! final validation reports whatever stayed unresolved.

mod casts;
mod columns;
mod functions;
mod tables;

pub use casts::{CoerceComparisonsRule, ResolveCastsRule};
pub use columns::{ResolveColumnsRule, ResolveStarRule};
pub use functions::ResolveFunctionsRule;
pub use tables::ResolveTablesRule;

use crate::planner::LogicalPlan;

use super::Analyzer;

/// Analyzer rule trait.
pub trait AnalyzerRule: Send + Sync {
    /// Returns the name of this rule.
    fn name(&self) -> &str;

    /// Rewrites the plan, returning it unchanged when nothing applies.
    fn apply(&self, analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan;
}

/// Rule built from a name and a plain function.
pub struct FnRule {
    name: String,
    apply: fn(&Analyzer, LogicalPlan) -> LogicalPlan,
}

impl FnRule {
    /// Creates a rule named `name` that rewrites through `apply`.
    #[must_use]
    pub fn new(name: impl Into<String>, apply: fn(&Analyzer, LogicalPlan) -> LogicalPlan) -> Self {
        FnRule {
            name: name.into(),
            apply,
        }
    }
}

impl AnalyzerRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        (self.apply)(analyzer, plan)
    }
}

/// Rules every analyzer starts with, in application order.
#[must_use]
pub fn default_rules() -> Vec<Box<dyn AnalyzerRule>> {
    vec![
        Box::new(ResolveTablesRule),
        Box::new(ResolveStarRule),
        Box::new(ResolveColumnsRule),
        Box::new(ResolveFunctionsRule),
        Box::new(CoerceComparisonsRule),
        Box::new(ResolveCastsRule),
    ]
}
