//! Built-in function constructors.

use crate::error::{ArborError, Result};

use super::Expression;

/// Builds a resolved function expression from its call arguments.
pub type FunctionConstructor = fn(Vec<Expression>) -> Result<Expression>;

/// Functions every catalog starts with.
#[must_use]
pub fn default_functions() -> Vec<(&'static str, FunctionConstructor)> {
    vec![
        ("count", new_count as FunctionConstructor),
        ("first", new_first as FunctionConstructor),
    ]
}

fn new_count(arguments: Vec<Expression>) -> Result<Expression> {
    single_argument("count", arguments).map(Expression::count)
}

fn new_first(arguments: Vec<Expression>) -> Result<Expression> {
    single_argument("first", arguments).map(Expression::first)
}

fn single_argument(name: &str, mut arguments: Vec<Expression>) -> Result<Expression> {
    match arguments.len() {
        1 => Ok(arguments.remove(0)),
        n => Err(ArborError::FunctionError(format!(
            "{name} expects 1 argument, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::AggregateFunction;

    #[test]
    fn test_default_constructors() {
        for (name, ctor) in default_functions() {
            let expr = ctor(vec![Expression::Star]).unwrap();
            match expr {
                Expression::Aggregate(agg) => assert_eq!(agg.function().name(), name),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_arity_checked() {
        let err = new_count(vec![]).unwrap_err();
        assert!(err.to_string().contains("count expects 1 argument, got 0"));
        assert!(new_first(vec![Expression::Star, Expression::Star]).is_err());
        assert_eq!(
            new_first(vec![Expression::literal(1)]).unwrap(),
            Expression::Aggregate(crate::expression::AggregateExpr::new(
                AggregateFunction::First,
                Expression::literal(1)
            ))
        );
    }
}
