//! Star expansion and column binding.

use tracing::debug;

use crate::analyzer::Analyzer;
use crate::catalog::ColumnDef;
use crate::error::{ArborError, Result};
use crate::expression::Expression;
use crate::planner::LogicalPlan;

use super::AnalyzerRule;

/// Expands a top-level `*` in a projection into one column per input column.
pub struct ResolveStarRule;

impl AnalyzerRule for ResolveStarRule {
    fn name(&self) -> &'static str {
        "resolve_star"
    }

    fn apply(&self, _analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_up(&mut |node| match node {
            LogicalPlan::Project { input, expressions }
                if expressions.contains(&Expression::Star) =>
            {
                let Ok(columns) = input_schema(&input) else {
                    return LogicalPlan::Project { input, expressions };
                };
                let expressions = expressions
                    .into_iter()
                    .flat_map(|expr| match expr {
                        Expression::Star => columns.iter().enumerate().map(bind).collect(),
                        other => vec![other],
                    })
                    .collect();
                LogicalPlan::Project { input, expressions }
            }
            other => other,
        })
    }
}

/// Binds column references against the output of the node's children.
///
/// Only nodes whose children are resolved are touched, so the child schema
/// is known.
pub struct ResolveColumnsRule;

impl AnalyzerRule for ResolveColumnsRule {
    fn name(&self) -> &'static str {
        "resolve_columns"
    }

    fn apply(&self, _analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_up(&mut |node| {
            let Ok(columns) = children_schema(&node) else {
                return node;
            };
            node.transform_expressions(&mut |expr| match expr {
                Expression::UnresolvedColumn { table, name } => {
                    match find_column(&columns, table.as_deref(), &name) {
                        Some(found) => found,
                        None => Expression::UnresolvedColumn { table, name },
                    }
                }
                other => other,
            })
        })
    }
}

fn input_schema(input: &LogicalPlan) -> Result<Vec<ColumnDef>> {
    if input.resolved() {
        input.schema()
    } else {
        Err(ArborError::UnresolvedPlan(Box::new(input.clone())))
    }
}

fn children_schema(node: &LogicalPlan) -> Result<Vec<ColumnDef>> {
    let mut columns = Vec::new();
    for child in node.children() {
        columns.extend(input_schema(child)?);
    }
    Ok(columns)
}

fn bind((index, column): (usize, &ColumnDef)) -> Expression {
    Expression::Column {
        index,
        table: column.source.clone(),
        name: column.name.clone(),
        data_type: column.data_type,
        nullable: column.nullable,
    }
}

fn find_column(columns: &[ColumnDef], table: Option<&str>, name: &str) -> Option<Expression> {
    let mut matches = columns.iter().enumerate().filter(|(_, c)| {
        c.name.eq_ignore_ascii_case(name)
            && table.map_or(true, |t| c.source.eq_ignore_ascii_case(t))
    });
    match (matches.next(), matches.next()) {
        (Some(found), None) => Some(bind(found)),
        (None, _) => {
            debug!(table = ?table, column = %name, "column not found");
            None
        }
        (Some(_), Some(_)) => {
            debug!(table = ?table, column = %name, "ambiguous column reference");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{Catalog, TableSchema};
    use crate::types::Type;

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(Catalog::with_defaults()))
    }

    fn users() -> LogicalPlan {
        let schema = TableSchema::new(
            "users",
            vec![
                ColumnDef::new("id", Type::BigInteger).unwrap().not_null(),
                ColumnDef::new("name", Type::String).unwrap(),
            ],
        )
        .unwrap();
        LogicalPlan::Table {
            database: "default".to_string(),
            schema: Arc::new(schema),
        }
    }

    #[test]
    fn test_star_expansion() {
        let plan = LogicalPlan::project(
            users(),
            vec![Expression::literal(1), Expression::Star],
        );
        let out = ResolveStarRule.apply(&analyzer(), plan);
        let names: Vec<String> = out.expressions().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["1", "id", "name"]);
        assert!(out.resolved());
    }

    #[test]
    fn test_star_waits_for_input() {
        let plan = LogicalPlan::project(
            LogicalPlan::unresolved_table("users"),
            vec![Expression::Star],
        );
        assert_eq!(ResolveStarRule.apply(&analyzer(), plan.clone()), plan);
    }

    #[test]
    fn test_resolves_qualified_and_unqualified() {
        let plan = LogicalPlan::project(
            LogicalPlan::filter(
                users(),
                Expression::not(Expression::qualified_column("USERS", "Name")),
            ),
            vec![Expression::column("id")],
        );
        let out = ResolveColumnsRule.apply(&analyzer(), plan);
        assert!(out.resolved());
        assert_eq!(
            out.expressions()[0],
            &Expression::Column {
                index: 0,
                table: "users".to_string(),
                name: "id".to_string(),
                data_type: Type::BigInteger,
                nullable: false,
            }
        );
    }

    #[test]
    fn test_unknown_column_stays_unresolved() {
        let plan = LogicalPlan::project(
            users(),
            vec![Expression::qualified_column("orders", "id")],
        );
        let out = ResolveColumnsRule.apply(&analyzer(), plan.clone());
        assert_eq!(out, plan);
    }

    #[test]
    fn test_resolves_against_projected_names() {
        let inner = LogicalPlan::project(
            users(),
            vec![Expression::alias(Expression::column("name"), "who")],
        );
        let plan = LogicalPlan::sort(
            inner,
            vec![crate::planner::SortExpr::asc(Expression::column("who"))],
        );
        // Bottom-up: the projection binds first, then the sort key sees its output.
        let once = ResolveColumnsRule.apply(&analyzer(), plan);
        assert!(once.resolved());
    }
}
