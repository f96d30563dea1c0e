//! Table resolution.

use tracing::debug;

use crate::analyzer::Analyzer;
use crate::planner::LogicalPlan;

use super::AnalyzerRule;

/// Binds `UnresolvedTable` nodes to catalog schemas.
///
/// A reference without a database is looked up in the analyzer's current
/// database.
pub struct ResolveTablesRule;

impl AnalyzerRule for ResolveTablesRule {
    fn name(&self) -> &'static str {
        "resolve_tables"
    }

    fn apply(&self, analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_up(&mut |node| match node {
            LogicalPlan::UnresolvedTable { database, name } => {
                let db = database
                    .clone()
                    .unwrap_or_else(|| analyzer.current_database().to_string());
                match analyzer.catalog().table(&db, &name) {
                    Some(schema) => LogicalPlan::Table {
                        database: db,
                        schema,
                    },
                    None => {
                        debug!(database = %db, table = %name, "table not found");
                        LogicalPlan::UnresolvedTable { database, name }
                    }
                }
            }
            other => other,
        })
    }
}
