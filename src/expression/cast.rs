//! Cast functions bound into `Cast` expressions.

use crate::error::Result;
use crate::types::{CastFn, Type, Value};

/// A cast function resolved from the registry for a specific type pair.
#[derive(Debug, Clone, Copy)]
pub struct BoundCast {
    from: Type,
    to: Type,
    func: CastFn,
}

// Two bindings are the same binding when they convert between the same types.
impl PartialEq for BoundCast {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for BoundCast {}

impl BoundCast {
    /// Binds a cast function to the pair it was looked up for.
    #[must_use]
    pub fn new(from: Type, to: Type, func: CastFn) -> Self {
        BoundCast { from, to, func }
    }

    /// Source type.
    #[must_use]
    pub fn from(&self) -> Type {
        self.from
    }

    /// Destination type.
    #[must_use]
    pub fn to(&self) -> Type {
        self.to
    }

    /// Applies the cast. `Null` passes through untouched.
    ///
    /// # Errors
    ///
    /// Propagates the cast function's error.
    pub fn apply(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        (self.func)(value)
    }
}
