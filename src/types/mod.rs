//! Scalar types, runtime values and the cast registry.

mod cast;
mod data_type;
mod value;

pub use cast::{register_default_type_casts, CastFn, TypeCast, TypeCastRegistry};
pub use data_type::{PrimitiveKind, Type};
pub use value::{Row, Value};
