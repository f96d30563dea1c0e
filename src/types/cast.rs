//! Explicit cast registry between ordered type pairs.

use chrono::{TimeZone, Utc};

use crate::error::{ArborError, Result};

use super::data_type::Type;
use super::value::Value;

/// A cast function from one type's canonical values to another's.
///
/// Cast functions are only called with non-null values.
pub type CastFn = fn(&Value) -> Result<Value>;

/// A registered cast between two types.
#[derive(Debug, Clone, Copy)]
pub struct TypeCast {
    pub from: Type,
    pub to: Type,
    pub cast: CastFn,
}

/// Holds cast functions between types.
///
/// Casts are one-directional; registering `a -> b` says nothing about `b -> a`.
#[derive(Debug, Clone, Default)]
pub struct TypeCastRegistry {
    casts: Vec<TypeCast>,
}

impl TypeCastRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        TypeCastRegistry { casts: Vec::new() }
    }

    /// Creates a registry holding the default casts.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = TypeCastRegistry::new();
        register_default_type_casts(&mut registry);
        registry
    }

    /// Registers a cast function between the given types.
    ///
    /// An existing entry for the same pair is replaced in place.
    pub fn register_type_cast(&mut self, from: Type, to: Type, cast: CastFn) {
        match self.casts.iter_mut().find(|tc| tc.from == from && tc.to == to) {
            Some(existing) => existing.cast = cast,
            None => self.casts.push(TypeCast { from, to, cast }),
        }
    }

    /// Returns the cast function between the given types.
    ///
    /// Casting a type to itself always yields the identity function.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchCast` if no cast is registered for the pair.
    pub fn type_cast(&self, from: Type, to: Type) -> Result<CastFn> {
        if from == to {
            return Ok(identity);
        }

        self.casts
            .iter()
            .find(|tc| tc.from == from && tc.to == to)
            .map(|tc| tc.cast)
            .ok_or_else(|| ArborError::NoSuchCast {
                from: from.name().to_string(),
                to: to.name().to_string(),
            })
    }

    /// Returns true if a cast is registered for the pair.
    #[must_use]
    pub fn contains(&self, from: Type, to: Type) -> bool {
        self.casts.iter().any(|tc| tc.from == from && tc.to == to)
    }

    /// Returns the number of registered casts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.casts.len()
    }

    /// Returns true if no casts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    /// Returns an iterator over the registered casts, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeCast> {
        self.casts.iter()
    }
}

/// Registers the default numeric, boolean and string casts.
pub fn register_default_type_casts(registry: &mut TypeCastRegistry) {
    registry.register_type_cast(Type::Integer, Type::BigInteger, |v| {
        Ok(Value::BigInteger(i64::from(int32(v)?)))
    });
    registry.register_type_cast(Type::Integer, Type::Float, |v| {
        Ok(Value::Float(f64::from(int32(v)?)))
    });
    registry.register_type_cast(Type::Integer, Type::Boolean, |v| {
        Ok(Value::Boolean(int32(v)? != 0))
    });
    registry.register_type_cast(Type::Integer, Type::String, |v| {
        Ok(Value::String(int32(v)?.to_string()))
    });
    registry.register_type_cast(Type::Integer, Type::TimestampWithTimezone, |v| {
        unix(i64::from(int32(v)?))
    });
    registry.register_type_cast(Type::BigInteger, Type::Integer, |v| {
        Ok(Value::Integer(int64(v)? as i32))
    });
    registry.register_type_cast(Type::BigInteger, Type::Float, |v| {
        Ok(Value::Float(int64(v)? as f64))
    });
    registry.register_type_cast(Type::BigInteger, Type::Boolean, |v| {
        Ok(Value::Boolean(int64(v)? != 0))
    });
    registry.register_type_cast(Type::BigInteger, Type::String, |v| {
        Ok(Value::String(int64(v)?.to_string()))
    });
    registry.register_type_cast(Type::BigInteger, Type::TimestampWithTimezone, |v| {
        unix(int64(v)?)
    });
    registry.register_type_cast(Type::Float, Type::Integer, |v| {
        Ok(Value::Integer(float64(v)? as i32))
    });
    registry.register_type_cast(Type::Float, Type::BigInteger, |v| {
        Ok(Value::BigInteger(float64(v)? as i64))
    });
    registry.register_type_cast(Type::Float, Type::Boolean, |v| {
        Ok(Value::Boolean(float64(v)? != 0.0))
    });
    registry.register_type_cast(Type::Float, Type::String, |v| {
        Ok(Value::String(format_float(float64(v)?)))
    });
    registry.register_type_cast(Type::Boolean, Type::Integer, |v| {
        Ok(Value::Integer(i32::from(boolean(v)?)))
    });
    registry.register_type_cast(Type::Boolean, Type::BigInteger, |v| {
        Ok(Value::BigInteger(i64::from(boolean(v)?)))
    });
    registry.register_type_cast(Type::Boolean, Type::Float, |v| {
        Ok(Value::Float(f64::from(u8::from(boolean(v)?))))
    });
    registry.register_type_cast(Type::Boolean, Type::String, |v| {
        Ok(Value::String(boolean(v)?.to_string()))
    });
    // Parse-based casts never fail on malformed input: they yield zero or false.
    registry.register_type_cast(Type::String, Type::Integer, |v| {
        Ok(Value::Integer(string(v)?.parse().unwrap_or(0)))
    });
    registry.register_type_cast(Type::String, Type::BigInteger, |v| {
        Ok(Value::BigInteger(string(v)?.parse().unwrap_or(0)))
    });
    registry.register_type_cast(Type::String, Type::Float, |v| {
        Ok(Value::Float(string(v)?.parse().unwrap_or(0.0)))
    });
    registry.register_type_cast(Type::String, Type::Boolean, |v| {
        Ok(Value::Boolean(parse_bool(string(v)?)))
    });
}

fn identity(v: &Value) -> Result<Value> {
    Ok(v.clone())
}

fn unix(secs: i64) -> Result<Value> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(Value::TimestampWithTimezone)
        .ok_or_else(|| ArborError::Overflow {
            value: secs.to_string(),
            target: Type::TimestampWithTimezone.name().to_string(),
        })
}

fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Formats a float with the shortest round-trip digits, switching to
/// exponent notation (`1e+21`, `1.5e-07`) when the decimal exponent is below
/// -4 or at least 6.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return v.to_string();
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..6).contains(&exp) {
        return v.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
}

fn mismatch(expected: Type, actual: &Value) -> ArborError {
    ArborError::TypeMismatch {
        expected: expected.name().to_string(),
        actual: actual.type_name().to_string(),
    }
}

fn int32(v: &Value) -> Result<i32> {
    v.as_integer().ok_or_else(|| mismatch(Type::Integer, v))
}

fn int64(v: &Value) -> Result<i64> {
    v.as_big_integer().ok_or_else(|| mismatch(Type::BigInteger, v))
}

fn float64(v: &Value) -> Result<f64> {
    v.as_float().ok_or_else(|| mismatch(Type::Float, v))
}

fn boolean(v: &Value) -> Result<bool> {
    v.as_bool().ok_or_else(|| mismatch(Type::Boolean, v))
}

fn string(v: &Value) -> Result<&str> {
    v.as_string().ok_or_else(|| mismatch(Type::String, v))
}
