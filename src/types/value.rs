//! Runtime values and rows.

use std::fmt;

use chrono::{DateTime, Utc};

use super::data_type::Type;

/// Runtime value container, tagged with the type it belongs to.
#[derive(Debug, Clone)]
pub enum Value {
    /// 32-bit signed integer value.
    Integer(i32),
    /// 64-bit signed integer value.
    BigInteger(i64),
    /// 64-bit floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// Epoch-like timestamp value.
    Timestamp(i64),
    /// UTC instant.
    TimestampWithTimezone(DateTime<Utc>),
    /// Null value.
    Null,
}

// Floats compare bitwise so that a value is always equal to itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInteger(a), Value::BigInteger(b))
            | (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::TimestampWithTimezone(a), Value::TimestampWithTimezone(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<Type> {
        match self {
            Value::Integer(_) => Some(Type::Integer),
            Value::BigInteger(_) => Some(Type::BigInteger),
            Value::Float(_) => Some(Type::Float),
            Value::String(_) => Some(Type::String),
            Value::Boolean(_) => Some(Type::Boolean),
            Value::Timestamp(_) => Some(Type::Timestamp),
            Value::TimestampWithTimezone(_) => Some(Type::TimestampWithTimezone),
            Value::Null => None,
        }
    }

    /// Returns the display name of this value's tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.data_type().map_or("null", |t| t.name())
    }

    /// Attempts to extract an i32 value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract an i64 value.
    #[must_use]
    pub fn as_big_integer(&self) -> Option<i64> {
        match self {
            Value::BigInteger(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to extract a bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInteger(v) | Value::Timestamp(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::TimestampWithTimezone(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Null => f.write_str("NULL"),
        }
    }
}

macro_rules! impl_from {
    ($($from:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$from> for Value {
                fn from(v: $from) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    u8 => Integer,
    u16 => Integer,
    i64 => BigInteger,
    u32 => BigInteger,
    f32 => Float,
    f64 => Float,
    bool => Boolean,
    String => String,
    DateTime<Utc> => TimestampWithTimezone,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A positional row of values.
///
/// Aggregate accumulators use a `Row` as their mutable buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from its values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Gets a value by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Replaces the value at `index`, returning false if out of bounds.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns the number of fields in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over the fields.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Returns the fields as a slice.
    #[must_use]
    pub fn fields(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}
