//! Scalar type catalog.

use std::cmp::Ordering;
use std::fmt;
use std::num::IntErrorKind;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{ArborError, Result};

use super::value::Value;

/// Supported scalar types.
///
/// Types are plain copyable descriptors; two types are the same type iff they
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInteger,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// 64-bit epoch-like timestamp.
    Timestamp,
    /// Instant with timezone, normalized to UTC.
    TimestampWithTimezone,
}

/// Underlying representation of a type's canonical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int32,
    Int64,
    Float64,
    String,
    Bool,
    DateTime,
}

impl Type {
    /// Every type in the catalog.
    pub const ALL: [Type; 7] = [
        Type::Integer,
        Type::BigInteger,
        Type::Float,
        Type::String,
        Type::Boolean,
        Type::Timestamp,
        Type::TimestampWithTimezone,
    ];

    /// Returns the display name of the type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Type::Integer => "integer",
            Type::BigInteger => "biginteger",
            Type::Float => "float",
            Type::String => "string",
            Type::Boolean => "boolean",
            Type::Timestamp => "timestamp",
            Type::TimestampWithTimezone => "timestamptz",
        }
    }

    /// Returns the primitive representation of this type's values.
    #[must_use]
    pub fn internal_type(&self) -> PrimitiveKind {
        match self {
            Type::Integer => PrimitiveKind::Int32,
            Type::BigInteger | Type::Timestamp => PrimitiveKind::Int64,
            Type::Float => PrimitiveKind::Float64,
            Type::String => PrimitiveKind::String,
            Type::Boolean => PrimitiveKind::Bool,
            Type::TimestampWithTimezone => PrimitiveKind::DateTime,
        }
    }

    /// Returns whether this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::BigInteger | Type::Float)
    }

    /// Returns true if `value` is in this type's canonical representation.
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        value.data_type() == Some(*self)
    }

    /// Converts a value into this type's canonical representation.
    ///
    /// `Null` converts to `Null` for every type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidType` if the value has no conversion path to this type,
    /// or `Overflow` if a numeric conversion would lose magnitude.
    pub fn convert(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            Type::Integer => {
                let v = self.convert_integer(value)?;
                i32::try_from(v)
                    .map(Value::Integer)
                    .map_err(|_| overflow(value, *self))
            }
            Type::BigInteger => self.convert_integer(value).map(Value::BigInteger),
            Type::Timestamp => self.convert_integer(value).map(Value::Timestamp),
            Type::Float => match value {
                Value::Integer(v) => Ok(Value::Float(f64::from(*v))),
                Value::BigInteger(v) | Value::Timestamp(v) => Ok(Value::Float(*v as f64)),
                Value::Float(v) => Ok(Value::Float(*v)),
                Value::String(s) => s
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| invalid_type(value, *self)),
                _ => Err(invalid_type(value, *self)),
            },
            Type::String => match value {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::TimestampWithTimezone(t) => Ok(Value::String(t.to_rfc3339())),
                _ => Err(invalid_type(value, *self)),
            },
            Type::Boolean => match value {
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                _ => Err(invalid_type(value, *self)),
            },
            Type::TimestampWithTimezone => match value {
                Value::TimestampWithTimezone(t) => Ok(Value::TimestampWithTimezone(*t)),
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|t| Value::TimestampWithTimezone(t.with_timezone(&Utc)))
                    .map_err(|_| invalid_type(value, *self)),
                Value::Integer(secs) => unix_seconds(i64::from(*secs), value, *self),
                Value::BigInteger(secs) => unix_seconds(*secs, value, *self),
                _ => Err(invalid_type(value, *self)),
            },
        }
    }

    /// Integer widening shared by the 32 and 64-bit integer-backed types.
    fn convert_integer(&self, value: &Value) -> Result<i64> {
        match value {
            Value::Integer(v) => Ok(i64::from(*v)),
            Value::BigInteger(v) | Value::Timestamp(v) => Ok(*v),
            Value::String(s) => s.parse::<i64>().map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => overflow(value, *self),
                _ => invalid_type(value, *self),
            }),
            _ => Err(invalid_type(value, *self)),
        }
    }

    /// Three-way comparison of two canonical values of this type.
    ///
    /// Strings compare lexicographically, `false < true`, floats use IEEE
    /// total ordering. Nulls are not ordered here.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if either value is not in this type's canonical
    /// representation.
    pub fn compare(&self, a: &Value, b: &Value) -> Result<Ordering> {
        match (self, a, b) {
            (Type::Integer, Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Type::BigInteger, Value::BigInteger(a), Value::BigInteger(b))
            | (Type::Timestamp, Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),
            (Type::Float, Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            (Type::String, Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Type::Boolean, Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (
                Type::TimestampWithTimezone,
                Value::TimestampWithTimezone(a),
                Value::TimestampWithTimezone(b),
            ) => Ok(a.cmp(b)),
            _ => {
                let offending = if self.check(a) { b } else { a };
                Err(ArborError::TypeMismatch {
                    expected: self.name().to_string(),
                    actual: offending.type_name().to_string(),
                })
            }
        }
    }

    /// Precedence used to pick the implicit conversion target between two types.
    #[must_use]
    pub fn coercion_rank(&self) -> u8 {
        match self {
            Type::String => 0,
            Type::Boolean => 1,
            Type::Integer => 2,
            Type::BigInteger => 3,
            Type::Float => 4,
            Type::Timestamp => 5,
            Type::TimestampWithTimezone => 6,
        }
    }

    /// Returns the type both operands of a mixed-type comparison convert to.
    ///
    /// The higher-ranked type wins, so the result does not depend on operand
    /// order. Numerics widen to the larger numeric type, numerics and booleans
    /// win over strings, and timestamps win over integers (the direction the
    /// default casts are registered in).
    #[must_use]
    pub fn common_type(left: Type, right: Type) -> Type {
        if left.coercion_rank() >= right.coercion_rank() {
            left
        } else {
            right
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unix_seconds(secs: i64, value: &Value, target: Type) -> Result<Value> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(Value::TimestampWithTimezone)
        .ok_or_else(|| overflow(value, target))
}

fn invalid_type(value: &Value, target: Type) -> ArborError {
    ArborError::InvalidType {
        value: value.to_string(),
        target: target.name().to_string(),
    }
}

fn overflow(value: &Value, target: Type) -> ArborError {
    ArborError::Overflow {
        value: value.to_string(),
        target: target.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_overflow_boundary() {
        let ok = Type::Integer.convert(&Value::BigInteger(2_147_483_647)).unwrap();
        assert_eq!(ok, Value::Integer(i32::MAX));

        let err = Type::Integer.convert(&Value::BigInteger(2_147_483_648)).unwrap_err();
        assert!(matches!(err, ArborError::Overflow { .. }));

        let err = Type::Integer.convert(&Value::BigInteger(-2_147_483_649)).unwrap_err();
        assert!(matches!(err, ArborError::Overflow { .. }));
    }

    #[test]
    fn test_integer_from_string() {
        assert_eq!(
            Type::Integer.convert(&Value::from("42")).unwrap(),
            Value::Integer(42)
        );
        assert!(matches!(
            Type::Integer.convert(&Value::from("forty")),
            Err(ArborError::InvalidType { .. })
        ));
        assert!(matches!(
            Type::Integer.convert(&Value::from("9999999999")),
            Err(ArborError::Overflow { .. })
        ));
        assert!(matches!(
            Type::BigInteger.convert(&Value::from("99999999999999999999")),
            Err(ArborError::Overflow { .. })
        ));
    }

    #[test]
    fn test_boolean_only_accepts_booleans() {
        assert_eq!(
            Type::Boolean.convert(&Value::Boolean(true)).unwrap(),
            Value::Boolean(true)
        );
        assert!(matches!(
            Type::Boolean.convert(&Value::Integer(1)),
            Err(ArborError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_timestamp_keeps_its_tag() {
        assert_eq!(
            Type::Timestamp.convert(&Value::Integer(7)).unwrap(),
            Value::Timestamp(7)
        );
        assert_eq!(
            Type::BigInteger.convert(&Value::Timestamp(7)).unwrap(),
            Value::BigInteger(7)
        );
    }

    #[test]
    fn test_timestamptz_from_rfc3339_and_seconds() {
        let parsed = Type::TimestampWithTimezone
            .convert(&Value::from("1970-01-01T01:00:00+01:00"))
            .unwrap();
        let from_secs = Type::TimestampWithTimezone
            .convert(&Value::BigInteger(0))
            .unwrap();
        assert_eq!(parsed, from_secs);
    }

    #[test]
    fn test_null_converts_to_null() {
        for t in Type::ALL {
            assert_eq!(t.convert(&Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_compare_orders() {
        assert_eq!(
            Type::Boolean
                .compare(&Value::Boolean(false), &Value::Boolean(true))
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Type::String
                .compare(&Value::from("b"), &Value::from("a"))
                .unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            Type::Float
                .compare(&Value::Float(f64::NAN), &Value::Float(f64::NAN))
                .unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_rejects_wrong_tag() {
        let err = Type::Integer
            .compare(&Value::Integer(1), &Value::BigInteger(1))
            .unwrap_err();
        assert!(err.to_string().contains("biginteger"));
    }

    #[test]
    fn test_common_type() {
        assert_eq!(Type::common_type(Type::Integer, Type::BigInteger), Type::BigInteger);
        assert_eq!(Type::common_type(Type::Float, Type::Integer), Type::Float);
        assert_eq!(Type::common_type(Type::String, Type::Integer), Type::Integer);
        assert_eq!(Type::common_type(Type::Boolean, Type::String), Type::Boolean);
        assert_eq!(
            Type::common_type(Type::TimestampWithTimezone, Type::Integer),
            Type::TimestampWithTimezone
        );
        assert_eq!(
            Type::common_type(Type::Integer, Type::TimestampWithTimezone),
            Type::TimestampWithTimezone
        );
    }

    #[test]
    fn test_common_type_is_symmetric() {
        for a in Type::ALL {
            for b in Type::ALL {
                assert_eq!(Type::common_type(a, b), Type::common_type(b, a), "{a} vs {b}");
            }
        }
    }
}
