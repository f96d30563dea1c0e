//! Scalar and aggregate expressions.
//!
//! Expressions are immutable trees. Every rewrite goes through
//! [`Expression::transform_up`], which rebuilds each node from its rewritten
//! children before handing the rebuilt node to the transformation.

mod aggregate;
mod cast;
mod comparison;
mod function;

pub use aggregate::{AggregateExpr, AggregateFunction};
pub use cast::BoundCast;
pub use comparison::ComparisonOp;
pub use function::{default_functions, FunctionConstructor};

use std::fmt;

use crate::error::{ArborError, Result};
use crate::types::{Row, Type, Value};

/// A scalar or aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Constant value.
    Literal { value: Value, data_type: Type },

    /// `*`, either in a projection or as the argument of `count`.
    Star,

    /// Column reference not yet bound to an input field.
    UnresolvedColumn {
        table: Option<String>,
        name: String,
    },

    /// Column bound to a position of the input row.
    Column {
        index: usize,
        table: String,
        name: String,
        data_type: Type,
        nullable: bool,
    },

    /// Renames its child's output.
    Alias { child: Box<Expression>, name: String },

    /// Logical negation.
    Not(Box<Expression>),

    /// Binary comparison.
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Explicit conversion to `target`; unresolved until a cast is bound.
    Cast {
        child: Box<Expression>,
        target: Type,
        cast: Option<BoundCast>,
    },

    /// Function call not yet bound through the catalog.
    UnresolvedFunction {
        name: String,
        arguments: Vec<Expression>,
    },

    /// Aggregate function.
    Aggregate(AggregateExpr),
}

impl Expression {
    /// Creates a literal, typed after its value (`Null` defaults to string).
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let data_type = value.data_type().unwrap_or(Type::String);
        Expression::Literal { value, data_type }
    }

    /// Creates a literal with an explicit type.
    #[must_use]
    pub fn typed_literal(value: Value, data_type: Type) -> Self {
        Expression::Literal { value, data_type }
    }

    /// Creates an unqualified column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Expression::UnresolvedColumn {
            table: None,
            name: name.into(),
        }
    }

    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::UnresolvedColumn {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Creates an alias.
    #[must_use]
    pub fn alias(child: Expression, name: impl Into<String>) -> Self {
        Expression::Alias {
            child: Box::new(child),
            name: name.into(),
        }
    }

    /// Creates a logical NOT.
    #[must_use]
    pub fn not(child: Expression) -> Self {
        Expression::Not(Box::new(child))
    }

    /// Creates a comparison.
    #[must_use]
    pub fn comparison(left: Expression, op: ComparisonOp, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn equals(left: Expression, right: Expression) -> Self {
        Expression::comparison(left, ComparisonOp::Equals, right)
    }

    #[must_use]
    pub fn greater_than(left: Expression, right: Expression) -> Self {
        Expression::comparison(left, ComparisonOp::GreaterThan, right)
    }

    #[must_use]
    pub fn less_than(left: Expression, right: Expression) -> Self {
        Expression::comparison(left, ComparisonOp::LessThan, right)
    }

    #[must_use]
    pub fn greater_than_or_equal(left: Expression, right: Expression) -> Self {
        Expression::comparison(left, ComparisonOp::GreaterThanOrEqual, right)
    }

    #[must_use]
    pub fn less_than_or_equal(left: Expression, right: Expression) -> Self {
        Expression::comparison(left, ComparisonOp::LessThanOrEqual, right)
    }

    /// Creates an unbound cast.
    #[must_use]
    pub fn cast(child: Expression, target: Type) -> Self {
        Expression::Cast {
            child: Box::new(child),
            target,
            cast: None,
        }
    }

    /// Creates an unresolved function call.
    #[must_use]
    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::UnresolvedFunction {
            name: name.into(),
            arguments,
        }
    }

    /// Creates a `count` aggregate.
    #[must_use]
    pub fn count(child: Expression) -> Self {
        Expression::Aggregate(AggregateExpr::new(AggregateFunction::Count, child))
    }

    /// Creates a `first` aggregate.
    #[must_use]
    pub fn first(child: Expression) -> Self {
        Expression::Aggregate(AggregateExpr::new(AggregateFunction::First, child))
    }

    /// Returns the display name of this expression.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Expression::Literal { value, .. } => value.to_string(),
            Expression::Star => "*".to_string(),
            Expression::UnresolvedColumn { table, name } => match table {
                Some(table) => format!("{table}.{name}"),
                None => name.clone(),
            },
            Expression::Column { name, .. } | Expression::Alias { name, .. } => name.clone(),
            Expression::Not(child) => format!("not({})", child.name()),
            Expression::Comparison { op, left, right } => {
                format!("{} {} {}", left.name(), op.as_str(), right.name())
            }
            Expression::Cast { child, target, .. } => {
                format!("cast({} as {})", child.name(), target.name())
            }
            Expression::UnresolvedFunction { name, arguments } => {
                let args: Vec<String> = arguments.iter().map(Expression::name).collect();
                format!("{name}({})", args.join(", "))
            }
            Expression::Aggregate(agg) => agg.name(),
        }
    }

    /// Returns the output type of this expression.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedExpression` if the type depends on a binding that
    /// has not happened yet.
    pub fn data_type(&self) -> Result<Type> {
        match self {
            Expression::Literal { data_type, .. } | Expression::Column { data_type, .. } => {
                Ok(*data_type)
            }
            Expression::Alias { child, .. } => child.data_type(),
            Expression::Not(_) | Expression::Comparison { .. } => Ok(Type::Boolean),
            Expression::Cast { target, .. } => Ok(*target),
            Expression::Aggregate(agg) => agg.data_type(),
            Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::UnresolvedFunction { .. } => {
                Err(ArborError::UnresolvedExpression(self.name()))
            }
        }
    }

    /// Returns whether this expression may evaluate to null.
    #[must_use]
    pub fn nullable(&self) -> bool {
        match self {
            Expression::Literal { value, .. } => value.is_null(),
            Expression::Column { nullable, .. } => *nullable,
            Expression::Alias { child, .. } | Expression::Not(child) => child.nullable(),
            Expression::Comparison { left, right, .. } => left.nullable() || right.nullable(),
            Expression::Cast { child, .. } => child.nullable(),
            Expression::Aggregate(agg) => agg.function() != AggregateFunction::Count,
            Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::UnresolvedFunction { .. } => true,
        }
    }

    /// Returns true if every name, type and function in this expression is bound.
    #[must_use]
    pub fn resolved(&self) -> bool {
        match self {
            Expression::Literal { .. } | Expression::Column { .. } => true,
            Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::UnresolvedFunction { .. } => false,
            Expression::Cast { child, cast, .. } => cast.is_some() && child.resolved(),
            Expression::Aggregate(agg) => agg.resolved(),
            _ => self.children().iter().all(|c| c.resolved()),
        }
    }

    /// Returns true if this expression is or contains an aggregate.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        matches!(self, Expression::Aggregate(_))
            || self.children().iter().any(|c| c.contains_aggregate())
    }

    /// Evaluates the expression against a row.
    ///
    /// # Errors
    ///
    /// Fails on unresolved expressions, on aggregates (which evaluate through
    /// their buffers), and on operand values of the wrong type.
    pub fn eval(&self, row: &Row) -> Result<Value> {
        match self {
            Expression::Literal { value, .. } => Ok(value.clone()),
            Expression::Column { index, name, .. } => row.get(*index).cloned().ok_or_else(|| {
                ArborError::InvalidExpression(format!(
                    "column {name} at index {index} is out of range for a row of {} fields",
                    row.len()
                ))
            }),
            Expression::Alias { child, .. } => child.eval(row),
            Expression::Not(child) => match child.eval(row)? {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                Value::Null => Ok(Value::Null),
                other => Err(ArborError::TypeMismatch {
                    expected: Type::Boolean.name().to_string(),
                    actual: other.type_name().to_string(),
                }),
            },
            Expression::Comparison { op, left, right } => {
                let a = left.eval(row)?;
                let b = right.eval(row)?;
                if a.is_null() || b.is_null() {
                    return Ok(Value::Null);
                }
                let ordering = left.data_type()?.compare(&a, &b)?;
                Ok(Value::Boolean(op.holds(ordering)))
            }
            Expression::Cast { child, cast, .. } => {
                let cast = cast.ok_or_else(|| ArborError::UnresolvedExpression(self.name()))?;
                cast.apply(&child.eval(row)?)
            }
            Expression::Aggregate(agg) => Err(ArborError::InvalidExpression(format!(
                "aggregate {} must be evaluated through its buffer",
                agg.name()
            ))),
            Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::UnresolvedFunction { .. } => {
                Err(ArborError::UnresolvedExpression(self.name()))
            }
        }
    }

    /// Returns the direct children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal { .. }
            | Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::Column { .. } => Vec::new(),
            Expression::Alias { child, .. }
            | Expression::Not(child)
            | Expression::Cast { child, .. } => vec![child.as_ref()],
            Expression::Comparison { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::UnresolvedFunction { arguments, .. } => arguments.iter().collect(),
            Expression::Aggregate(agg) => vec![agg.child()],
        }
    }

    /// Rebuilds this node with each child replaced by `f(child)`.
    ///
    /// Variant fields (operator, alias name, target type, aggregate function)
    /// are carried over. A bound cast is kept only while its source type still
    /// matches the new child.
    #[must_use]
    pub fn map_children<F>(&self, mut f: F) -> Expression
    where
        F: FnMut(&Expression) -> Expression,
    {
        match self {
            Expression::Literal { .. }
            | Expression::Star
            | Expression::UnresolvedColumn { .. }
            | Expression::Column { .. } => self.clone(),
            Expression::Alias { child, name } => Expression::alias(f(child.as_ref()), name.clone()),
            Expression::Not(child) => Expression::not(f(child.as_ref())),
            Expression::Comparison { op, left, right } => {
                let left = f(left.as_ref());
                let right = f(right.as_ref());
                Expression::comparison(left, *op, right)
            }
            Expression::Cast {
                child,
                target,
                cast,
            } => {
                let child = f(child.as_ref());
                let cast = cast.filter(|c| child.data_type().ok() == Some(c.from()));
                Expression::Cast {
                    child: Box::new(child),
                    target: *target,
                    cast,
                }
            }
            Expression::UnresolvedFunction { name, arguments } => Expression::UnresolvedFunction {
                name: name.clone(),
                arguments: arguments.iter().map(f).collect(),
            },
            Expression::Aggregate(agg) => Expression::Aggregate(agg.with_child(f(agg.child()))),
        }
    }

    /// Rewrites the tree bottom-up: children first, then the rebuilt node.
    #[must_use]
    pub fn transform_up<F>(&self, f: &mut F) -> Expression
    where
        F: FnMut(Expression) -> Expression,
    {
        let rebuilt = self.map_children(|child| child.transform_up(f));
        f(rebuilt)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
