//! Function binding.

use tracing::debug;

use crate::analyzer::Analyzer;
use crate::expression::Expression;
use crate::planner::LogicalPlan;

use super::AnalyzerRule;

/// Replaces function calls with the expression built by the catalog's
/// constructor for that name.
pub struct ResolveFunctionsRule;

impl AnalyzerRule for ResolveFunctionsRule {
    fn name(&self) -> &'static str {
        "resolve_functions"
    }

    fn apply(&self, analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_expressions_up(&mut |expr| match expr {
            Expression::UnresolvedFunction { name, arguments } => {
                let Some(constructor) = analyzer.catalog().function(&name) else {
                    debug!(function = %name, "function not found");
                    return Expression::UnresolvedFunction { name, arguments };
                };
                match constructor(arguments.clone()) {
                    Ok(expr) => expr,
                    Err(e) => {
                        debug!(function = %name, error = %e, "function constructor failed");
                        Expression::UnresolvedFunction { name, arguments }
                    }
                }
            }
            other => other,
        })
    }
}
