//! Catalog for table and function lookups.

mod schema;

pub use schema::{Catalog, ColumnDef, TableSchema, DEFAULT_DATABASE};
