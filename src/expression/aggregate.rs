//! Aggregate expressions and their accumulator protocol.
//!
//! An aggregate never evaluates against input rows directly. Callers create a
//! buffer with [`AggregateExpr::new_buffer`], fold rows into it with
//! [`AggregateExpr::update`], combine independently built buffers with
//! [`AggregateExpr::merge`], and read the result with [`AggregateExpr::eval`].
//! Buffers carry no synchronization: each one belongs to a single group.

use rayon::prelude::*;

use crate::error::{ArborError, Result};
use crate::types::{Row, Type, Value};

use super::Expression;

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Number of rows, or of non-null values of the argument.
    Count,
    /// First non-null value seen.
    First,
}

impl AggregateFunction {
    /// Returns the name of this aggregate function.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::First => "first",
        }
    }
}

/// An aggregate function applied to a child expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateExpr {
    function: AggregateFunction,
    child: Box<Expression>,
}

impl AggregateExpr {
    /// Creates an aggregate over `child`.
    #[must_use]
    pub fn new(function: AggregateFunction, child: Expression) -> Self {
        AggregateExpr {
            function,
            child: Box::new(child),
        }
    }

    /// Returns the aggregate function.
    #[must_use]
    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    /// Returns the aggregated expression.
    #[must_use]
    pub fn child(&self) -> &Expression {
        &self.child
    }

    /// Returns the same aggregate over a different child.
    #[must_use]
    pub fn with_child(&self, child: Expression) -> Self {
        AggregateExpr::new(self.function, child)
    }

    /// Returns the display name, e.g. `count(*)`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}({})", self.function.name(), self.child.name())
    }

    /// Returns the output type.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedExpression` if `first` wraps an untyped child.
    pub fn data_type(&self) -> Result<Type> {
        match self.function {
            AggregateFunction::Count => Ok(Type::Integer),
            AggregateFunction::First => self.child.data_type(),
        }
    }

    /// `count(*)` is resolved as is; everything else needs a resolved child.
    #[must_use]
    pub fn resolved(&self) -> bool {
        self.counts_rows() || self.child.resolved()
    }

    fn counts_rows(&self) -> bool {
        self.function == AggregateFunction::Count && *self.child == Expression::Star
    }

    /// Returns an empty accumulator.
    #[must_use]
    pub fn new_buffer(&self) -> Row {
        match self.function {
            AggregateFunction::Count => Row::new(vec![Value::Integer(0)]),
            AggregateFunction::First => Row::new(vec![Value::Null]),
        }
    }

    /// Folds one input row into `buffer`.
    ///
    /// # Errors
    ///
    /// Fails if the child cannot be evaluated, the buffer was not created by
    /// this aggregate, or the counter overflows.
    pub fn update(&self, buffer: &mut Row, row: &Row) -> Result<()> {
        match self.function {
            AggregateFunction::Count => {
                let counted = self.counts_rows() || !self.child.eval(row)?.is_null();
                if counted {
                    let count = counter(buffer)?;
                    store(buffer, Value::Integer(checked_add(count, 1)?))?;
                }
            }
            AggregateFunction::First => {
                if slot(buffer)?.is_null() {
                    let value = self.child.eval(row)?;
                    store(buffer, value)?;
                }
            }
        }
        Ok(())
    }

    /// Combines `partial` into `buffer`.
    ///
    /// # Errors
    ///
    /// Fails if either buffer was not created by this aggregate, or the
    /// counter overflows.
    pub fn merge(&self, buffer: &mut Row, partial: &Row) -> Result<()> {
        match self.function {
            AggregateFunction::Count => {
                let total = checked_add(counter(buffer)?, counter(partial)?)?;
                store(buffer, Value::Integer(total))
            }
            AggregateFunction::First => {
                if slot(buffer)?.is_null() {
                    let value = slot(partial)?.clone();
                    store(buffer, value)?;
                }
                Ok(())
            }
        }
    }

    /// Reads the finished accumulator.
    ///
    /// # Errors
    ///
    /// Fails if the buffer was not created by this aggregate.
    pub fn eval(&self, buffer: &Row) -> Result<Value> {
        match self.function {
            AggregateFunction::Count => counter(buffer).map(Value::Integer),
            AggregateFunction::First => slot(buffer).cloned(),
        }
    }

    /// Accumulates `rows` into a fresh buffer and returns the result.
    ///
    /// # Errors
    ///
    /// Propagates the first update error.
    pub fn accumulate(&self, rows: &[Row]) -> Result<Value> {
        let mut buffer = self.new_buffer();
        for row in rows {
            self.update(&mut buffer, row)?;
        }
        self.eval(&buffer)
    }

    /// Accumulates `rows` in parallel partitions of `partition_size` rows.
    ///
    /// Each partition owns its buffer; partial buffers are combined through
    /// [`AggregateExpr::merge`] in partition order, so `first` sees the same
    /// row it would in [`AggregateExpr::accumulate`].
    ///
    /// # Errors
    ///
    /// Propagates any update or merge error.
    pub fn accumulate_partitioned(&self, rows: &[Row], partition_size: usize) -> Result<Value> {
        let buffer = rows
            .par_chunks(partition_size.max(1))
            .map(|partition| -> Result<Row> {
                let mut buffer = self.new_buffer();
                for row in partition {
                    self.update(&mut buffer, row)?;
                }
                Ok(buffer)
            })
            .try_reduce(
                || self.new_buffer(),
                |mut left, right| -> Result<Row> {
                    self.merge(&mut left, &right)?;
                    Ok(left)
                },
            )?;
        self.eval(&buffer)
    }
}

fn slot(buffer: &Row) -> Result<&Value> {
    buffer
        .get(0)
        .ok_or_else(|| ArborError::InvalidExpression("empty aggregate buffer".to_string()))
}

fn store(buffer: &mut Row, value: Value) -> Result<()> {
    if buffer.set(0, value) {
        Ok(())
    } else {
        Err(ArborError::InvalidExpression(
            "empty aggregate buffer".to_string(),
        ))
    }
}

fn counter(buffer: &Row) -> Result<i32> {
    match slot(buffer)? {
        Value::Integer(count) => Ok(*count),
        other => Err(ArborError::TypeMismatch {
            expected: Type::Integer.name().to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

fn checked_add(a: i32, b: i32) -> Result<i32> {
    a.checked_add(b).ok_or_else(|| ArborError::Overflow {
        value: format!("{a} + {b}"),
        target: Type::Integer.name().to_string(),
    })
}
