//! Logical plan definitions.

use std::fmt;
use std::sync::Arc;

use crate::catalog::{ColumnDef, TableSchema};
use crate::error::{ArborError, Result};
use crate::expression::Expression;

/// Logical query plan (what to compute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalPlan {
    // === Sources ===
    /// Table reference not yet looked up in the catalog.
    UnresolvedTable {
        /// Explicit database, or the analyzer's current one.
        database: Option<String>,
        name: String,
    },

    /// Table bound to its catalog schema.
    Table {
        database: String,
        schema: Arc<TableSchema>,
    },

    // === Relational Operators ===
    /// Project expressions.
    Project {
        input: Box<LogicalPlan>,
        expressions: Vec<Expression>,
    },

    /// Filter rows.
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expression,
    },

    /// Aggregation with GROUP BY.
    GroupBy {
        input: Box<LogicalPlan>,
        /// Output expressions (aggregates and grouping columns).
        aggregates: Vec<Expression>,
        grouping: Vec<Expression>,
    },

    /// Sort rows.
    Sort {
        input: Box<LogicalPlan>,
        order_by: Vec<SortExpr>,
    },

    /// Keep the first `count` rows.
    Limit { input: Box<LogicalPlan>, count: usize },

    /// Skip the first `count` rows.
    Offset { input: Box<LogicalPlan>, count: usize },
}

impl LogicalPlan {
    /// Creates a table reference in the current database.
    #[must_use]
    pub fn unresolved_table(name: impl Into<String>) -> Self {
        LogicalPlan::UnresolvedTable {
            database: None,
            name: name.into(),
        }
    }

    /// Creates a table reference in an explicit database.
    #[must_use]
    pub fn qualified_table(database: impl Into<String>, name: impl Into<String>) -> Self {
        LogicalPlan::UnresolvedTable {
            database: Some(database.into()),
            name: name.into(),
        }
    }

    /// Creates a project plan.
    #[must_use]
    pub fn project(input: LogicalPlan, expressions: Vec<Expression>) -> Self {
        LogicalPlan::Project {
            input: Box::new(input),
            expressions,
        }
    }

    /// Creates a filter plan.
    #[must_use]
    pub fn filter(input: LogicalPlan, predicate: Expression) -> Self {
        LogicalPlan::Filter {
            input: Box::new(input),
            predicate,
        }
    }

    /// Creates a group-by plan.
    #[must_use]
    pub fn group_by(
        input: LogicalPlan,
        aggregates: Vec<Expression>,
        grouping: Vec<Expression>,
    ) -> Self {
        LogicalPlan::GroupBy {
            input: Box::new(input),
            aggregates,
            grouping,
        }
    }

    /// Creates a sort plan.
    #[must_use]
    pub fn sort(input: LogicalPlan, order_by: Vec<SortExpr>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(input),
            order_by,
        }
    }

    /// Creates a limit plan.
    #[must_use]
    pub fn limit(input: LogicalPlan, count: usize) -> Self {
        LogicalPlan::Limit {
            input: Box::new(input),
            count,
        }
    }

    /// Creates an offset plan.
    #[must_use]
    pub fn offset(input: LogicalPlan, count: usize) -> Self {
        LogicalPlan::Offset {
            input: Box::new(input),
            count,
        }
    }

    /// Returns true if this node, its expressions and all of its
    /// descendants are fully bound and typed.
    #[must_use]
    pub fn resolved(&self) -> bool {
        match self {
            LogicalPlan::UnresolvedTable { .. } => false,
            _ => {
                self.children().iter().all(|c| c.resolved())
                    && self.expressions().iter().all(|e| e.resolved())
            }
        }
    }

    /// Returns the child plans.
    #[must_use]
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::UnresolvedTable { .. } | LogicalPlan::Table { .. } => vec![],
            LogicalPlan::Project { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::GroupBy { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Offset { input, .. } => vec![input.as_ref()],
        }
    }

    /// Returns the expressions held by this node (not its children).
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            LogicalPlan::UnresolvedTable { .. }
            | LogicalPlan::Table { .. }
            | LogicalPlan::Limit { .. }
            | LogicalPlan::Offset { .. } => vec![],
            LogicalPlan::Project { expressions, .. } => expressions.iter().collect(),
            LogicalPlan::Filter { predicate, .. } => vec![predicate],
            LogicalPlan::GroupBy {
                aggregates,
                grouping,
                ..
            } => aggregates.iter().chain(grouping.iter()).collect(),
            LogicalPlan::Sort { order_by, .. } => order_by.iter().map(|s| &s.expr).collect(),
        }
    }

    /// Returns the output columns of this node.
    ///
    /// # Errors
    ///
    /// Fails if the output depends on a table or expression that is not
    /// resolved yet.
    pub fn schema(&self) -> Result<Vec<ColumnDef>> {
        match self {
            LogicalPlan::UnresolvedTable { .. } => {
                Err(ArborError::UnresolvedPlan(Box::new(self.clone())))
            }
            LogicalPlan::Table { schema, .. } => Ok(schema.columns.clone()),
            LogicalPlan::Project { expressions, .. } => {
                expressions.iter().map(output_column).collect()
            }
            LogicalPlan::GroupBy { aggregates, .. } => {
                aggregates.iter().map(output_column).collect()
            }
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. }
            | LogicalPlan::Offset { input, .. } => input.schema(),
        }
    }

    /// Rebuilds this node with each child replaced by `f(child)`.
    #[must_use]
    pub fn map_children<F>(&self, mut f: F) -> LogicalPlan
    where
        F: FnMut(&LogicalPlan) -> LogicalPlan,
    {
        match self {
            LogicalPlan::UnresolvedTable { .. } | LogicalPlan::Table { .. } => self.clone(),
            LogicalPlan::Project { input, expressions } => {
                LogicalPlan::project(f(input.as_ref()), expressions.clone())
            }
            LogicalPlan::Filter { input, predicate } => {
                LogicalPlan::filter(f(input.as_ref()), predicate.clone())
            }
            LogicalPlan::GroupBy {
                input,
                aggregates,
                grouping,
            } => {
                let input = f(input.as_ref());
                LogicalPlan::group_by(input, aggregates.clone(), grouping.clone())
            }
            LogicalPlan::Sort { input, order_by } => {
                LogicalPlan::sort(f(input.as_ref()), order_by.clone())
            }
            LogicalPlan::Limit { input, count } => LogicalPlan::limit(f(input.as_ref()), *count),
            LogicalPlan::Offset { input, count } => LogicalPlan::offset(f(input.as_ref()), *count),
        }
    }

    /// Rebuilds this node with each of its own expressions replaced by `f(expr)`.
    #[must_use]
    pub fn map_expressions<F>(&self, mut f: F) -> LogicalPlan
    where
        F: FnMut(&Expression) -> Expression,
    {
        match self {
            LogicalPlan::UnresolvedTable { .. }
            | LogicalPlan::Table { .. }
            | LogicalPlan::Limit { .. }
            | LogicalPlan::Offset { .. } => self.clone(),
            LogicalPlan::Project { input, expressions } => LogicalPlan::Project {
                input: input.clone(),
                expressions: expressions.iter().map(f).collect(),
            },
            LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
                input: input.clone(),
                predicate: f(predicate),
            },
            LogicalPlan::GroupBy {
                input,
                aggregates,
                grouping,
            } => {
                let aggregates = aggregates.iter().map(&mut f).collect();
                let grouping = grouping.iter().map(&mut f).collect();
                LogicalPlan::GroupBy {
                    input: input.clone(),
                    aggregates,
                    grouping,
                }
            }
            LogicalPlan::Sort { input, order_by } => LogicalPlan::Sort {
                input: input.clone(),
                order_by: order_by
                    .iter()
                    .map(|s| SortExpr {
                        expr: f(&s.expr),
                        ..s.clone()
                    })
                    .collect(),
            },
        }
    }

    /// Rewrites the plan bottom-up: children first, then the rebuilt node.
    #[must_use]
    pub fn transform_up<F>(&self, f: &mut F) -> LogicalPlan
    where
        F: FnMut(LogicalPlan) -> LogicalPlan,
    {
        let rebuilt = self.map_children(|child| child.transform_up(f));
        f(rebuilt)
    }

    /// Rewrites every expression of this node (not its children) bottom-up.
    #[must_use]
    pub fn transform_expressions<F>(&self, f: &mut F) -> LogicalPlan
    where
        F: FnMut(Expression) -> Expression,
    {
        self.map_expressions(|e| e.transform_up(f))
    }

    /// Rewrites every expression of every node bottom-up, children first.
    #[must_use]
    pub fn transform_expressions_up<F>(&self, f: &mut F) -> LogicalPlan
    where
        F: FnMut(Expression) -> Expression,
    {
        self.transform_up(&mut |node| node.transform_expressions(f))
    }

    /// Returns a one-line description of this node.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            LogicalPlan::UnresolvedTable { database, name } => match database {
                Some(db) => format!("UnresolvedTable({db}.{name})"),
                None => format!("UnresolvedTable({name})"),
            },
            LogicalPlan::Table { database, schema } => format!("Table({database}.{})", schema.name),
            LogicalPlan::Project { expressions, .. } => {
                format!("Project({})", join_names(expressions))
            }
            LogicalPlan::Filter { predicate, .. } => format!("Filter({predicate})"),
            LogicalPlan::GroupBy {
                aggregates,
                grouping,
                ..
            } => format!(
                "GroupBy(aggregates: [{}], grouping: [{}])",
                join_names(aggregates),
                join_names(grouping)
            ),
            LogicalPlan::Sort { order_by, .. } => {
                let orders: Vec<String> = order_by.iter().map(SortExpr::to_string).collect();
                format!("Sort({})", orders.join(", "))
            }
            LogicalPlan::Limit { count, .. } => format!("Limit({count})"),
            LogicalPlan::Offset { count, .. } => format!("Offset({count})"),
        }
    }

    /// Formats the plan as a tree with indentation.
    fn format_plan(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(f, "{}{}", "  ".repeat(indent), self.describe())?;
        for child in self.children() {
            child.format_plan(f, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format_plan(f, 0)
    }
}

fn join_names(exprs: &[Expression]) -> String {
    exprs
        .iter()
        .map(Expression::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn output_column(expr: &Expression) -> Result<ColumnDef> {
    let source = match expr {
        Expression::Column { table, .. } => table.clone(),
        _ => String::new(),
    };
    Ok(ColumnDef {
        name: expr.name(),
        data_type: expr.data_type()?,
        nullable: expr.nullable(),
        source,
    })
}

/// Sort expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpr {
    pub expr: Expression,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl SortExpr {
    /// Creates a new ascending sort expression.
    #[must_use]
    pub fn asc(expr: Expression) -> Self {
        SortExpr {
            expr,
            ascending: true,
            nulls_first: false,
        }
    }

    /// Creates a new descending sort expression.
    #[must_use]
    pub fn desc(expr: Expression) -> Self {
        SortExpr {
            expr,
            ascending: false,
            nulls_first: false,
        }
    }
}

impl fmt::Display for SortExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {dir}", self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn users() -> LogicalPlan {
        let schema = TableSchema::new(
            "users",
            vec![
                ColumnDef::new("id", Type::BigInteger).unwrap(),
                ColumnDef::new("name", Type::String).unwrap(),
            ],
        )
        .unwrap();
        LogicalPlan::Table {
            database: "default".to_string(),
            schema: Arc::new(schema),
        }
    }

    fn id_column() -> Expression {
        Expression::Column {
            index: 0,
            table: "users".to_string(),
            name: "id".to_string(),
            data_type: Type::BigInteger,
            nullable: true,
        }
    }

    #[test]
    fn test_resolution_is_bottom_up() {
        let unresolved = LogicalPlan::limit(LogicalPlan::unresolved_table("users"), 1);
        assert!(!unresolved.resolved());

        let plan = LogicalPlan::project(users(), vec![Expression::column("id")]);
        assert!(!plan.resolved());

        let plan = LogicalPlan::project(users(), vec![id_column()]);
        assert!(plan.resolved());
    }

    #[test]
    fn test_schema_of_project() {
        let plan = LogicalPlan::project(
            users(),
            vec![
                id_column(),
                Expression::alias(Expression::literal(true), "flag"),
            ],
        );
        let schema = plan.schema().unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].source, "users");
        assert_eq!(schema[1].name, "flag");
        assert_eq!(schema[1].data_type, Type::Boolean);
    }

    #[test]
    fn test_schema_of_unresolved_fails() {
        assert!(LogicalPlan::unresolved_table("users").schema().is_err());
        let plan = LogicalPlan::project(users(), vec![Expression::column("id")]);
        assert!(plan.schema().is_err());
    }

    #[test]
    fn test_transform_up_identity() {
        let plan = LogicalPlan::offset(
            LogicalPlan::sort(
                LogicalPlan::filter(users(), Expression::not(Expression::column("x"))),
                vec![SortExpr::desc(id_column())],
            ),
            3,
        );
        assert_eq!(plan.transform_up(&mut |n| n), plan);
        assert_eq!(plan.transform_expressions_up(&mut |e| e), plan);
    }

    #[test]
    fn test_transform_expressions_up_reaches_every_node() {
        let plan = LogicalPlan::project(
            LogicalPlan::filter(users(), Expression::column("id")),
            vec![Expression::column("id")],
        );
        let out = plan.transform_expressions_up(&mut |e| match e {
            Expression::UnresolvedColumn { .. } => id_column(),
            other => other,
        });
        assert!(out.resolved());
    }

    #[test]
    fn test_display_tree() {
        let plan = LogicalPlan::limit(
            LogicalPlan::project(
                LogicalPlan::unresolved_table("users"),
                vec![Expression::Star],
            ),
            10,
        );
        let text = plan.to_string();
        assert_eq!(
            text,
            "Limit(10)\n  Project(*)\n    UnresolvedTable(users)\n"
        );
    }
}
