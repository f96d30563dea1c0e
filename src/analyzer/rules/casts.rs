//! Implicit comparison coercion and cast binding.

use tracing::debug;

use crate::analyzer::Analyzer;
use crate::expression::{BoundCast, Expression};
use crate::planner::LogicalPlan;
use crate::types::Type;

use super::AnalyzerRule;

/// Wraps the lower-ranked operand of a mixed-type comparison in a cast to
/// the common type.
pub struct CoerceComparisonsRule;

impl AnalyzerRule for CoerceComparisonsRule {
    fn name(&self) -> &'static str {
        "coerce_comparisons"
    }

    fn apply(&self, _analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_expressions_up(&mut |expr| match expr {
            Expression::Comparison { op, left, right } if left.resolved() && right.resolved() => {
                match (left.data_type(), right.data_type()) {
                    (Ok(l), Ok(r)) if l != r => {
                        let common = Type::common_type(l, r);
                        Expression::comparison(
                            coerce(*left, l, common),
                            op,
                            coerce(*right, r, common),
                        )
                    }
                    _ => Expression::Comparison { op, left, right },
                }
            }
            other => other,
        })
    }
}

fn coerce(expr: Expression, from: Type, to: Type) -> Expression {
    if from == to {
        expr
    } else {
        Expression::cast(expr, to)
    }
}

/// Binds unbound casts through the analyzer's cast registry once the child
/// type is known.
pub struct ResolveCastsRule;

impl AnalyzerRule for ResolveCastsRule {
    fn name(&self) -> &'static str {
        "resolve_casts"
    }

    fn apply(&self, analyzer: &Analyzer, plan: LogicalPlan) -> LogicalPlan {
        plan.transform_expressions_up(&mut |expr| match expr {
            Expression::Cast {
                child,
                target,
                cast: None,
            } if child.resolved() => {
                let cast = child.data_type().ok().and_then(|from| {
                    match analyzer.type_casts().type_cast(from, target) {
                        Ok(func) => Some(BoundCast::new(from, target, func)),
                        Err(e) => {
                            debug!(error = %e, "cast left unbound");
                            None
                        }
                    }
                });
                Expression::Cast {
                    child,
                    target,
                    cast,
                }
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{Catalog, ColumnDef, TableSchema};
    use crate::types::{Row, Value};

    fn analyzer() -> Analyzer {
        Analyzer::new(Arc::new(Catalog::with_defaults()))
    }

    fn filter(predicate: Expression) -> LogicalPlan {
        let schema =
            TableSchema::new("t", vec![ColumnDef::new("a", Type::Integer).unwrap()]).unwrap();
        LogicalPlan::filter(
            LogicalPlan::Table {
                database: "default".to_string(),
                schema: Arc::new(schema),
            },
            predicate,
        )
    }

    #[test]
    fn test_coerces_lower_ranked_operand() {
        let plan = filter(Expression::greater_than(
            Expression::literal(2),
            Expression::literal(1.5),
        ));
        let out = CoerceComparisonsRule.apply(&analyzer(), plan);
        assert_eq!(
            out.expressions()[0],
            &Expression::greater_than(
                Expression::cast(Expression::literal(2), Type::Float),
                Expression::literal(1.5),
            )
        );
        // Already coerced comparisons are left alone.
        assert_eq!(CoerceComparisonsRule.apply(&analyzer(), out.clone()), out);
    }

    #[test]
    fn test_binds_cast_and_evaluates() {
        let plan = filter(Expression::greater_than(
            Expression::literal(2),
            Expression::literal(1.5),
        ));
        let analyzer = analyzer();
        let coerced = CoerceComparisonsRule.apply(&analyzer, plan);
        let bound = ResolveCastsRule.apply(&analyzer, coerced);
        assert!(bound.resolved());
        let predicate = bound.expressions()[0];
        assert_eq!(predicate.eval(&Row::default()).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_coercion_ignores_operand_order() {
        let at = || {
            Expression::literal(Value::TimestampWithTimezone(
                chrono::DateTime::from_timestamp(10, 0).unwrap(),
            ))
        };
        let analyzer = analyzer();
        let bind = |predicate| {
            let coerced = CoerceComparisonsRule.apply(&analyzer, filter(predicate));
            ResolveCastsRule.apply(&analyzer, coerced)
        };

        let right = bind(Expression::greater_than(at(), Expression::literal(5)));
        let left = bind(Expression::less_than(Expression::literal(5), at()));
        assert!(right.resolved());
        assert!(left.resolved());
        assert_eq!(
            Type::common_type(Type::Integer, Type::TimestampWithTimezone),
            Type::TimestampWithTimezone
        );
        for plan in [&right, &left] {
            let predicate = plan.expressions()[0];
            assert_eq!(predicate.eval(&Row::default()).unwrap(), Value::Boolean(true));
        }
    }

    #[test]
    fn test_missing_cast_stays_unbound() {
        let plan = filter(Expression::equals(
            Expression::cast(Expression::literal(true), Type::Timestamp),
            Expression::literal(Value::Timestamp(0)),
        ));
        let out = ResolveCastsRule.apply(&analyzer(), plan.clone());
        assert_eq!(out, plan);
        assert!(!out.resolved());
    }
}
