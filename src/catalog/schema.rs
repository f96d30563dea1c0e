//! Databases, table schemas and the function table.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ArborError, Result};
use crate::expression::{default_functions, FunctionConstructor};
use crate::types::Type;

/// Name of the database every default catalog starts with.
pub const DEFAULT_DATABASE: &str = "default";

/// Lookup collaborator for the analyzer: tables per database and functions.
///
/// Names are matched case-insensitively. The catalog is shared as
/// `Arc<Catalog>`; registrations take a write lock, lookups a read lock.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Tables keyed by lowercased database, then table name.
    databases: RwLock<HashMap<String, HashMap<String, Arc<TableSchema>>>>,
    /// Function constructors keyed by lowercased name.
    functions: RwLock<HashMap<String, FunctionConstructor>>,
}

impl Catalog {
    /// Creates an empty catalog with no databases and no functions.
    #[must_use]
    pub fn new() -> Self {
        Catalog {
            databases: RwLock::new(HashMap::new()),
            functions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a catalog holding the default database and default functions.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut databases = HashMap::new();
        databases.insert(DEFAULT_DATABASE.to_string(), HashMap::new());

        let functions = default_functions()
            .into_iter()
            .map(|(name, ctor)| (name.to_string(), ctor))
            .collect();

        Catalog {
            databases: RwLock::new(databases),
            functions: RwLock::new(functions),
        }
    }

    /// Creates an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database already exists.
    pub fn create_database(&self, name: &str) -> Result<()> {
        let mut databases = self.databases.write();
        let key = name.to_lowercase();
        if databases.contains_key(&key) {
            return Err(ArborError::SchemaError(format!(
                "Database '{name}' already exists"
            )));
        }
        databases.insert(key, HashMap::new());
        Ok(())
    }

    /// Checks if a database exists.
    #[must_use]
    pub fn database_exists(&self, name: &str) -> bool {
        self.databases.read().contains_key(&name.to_lowercase())
    }

    /// Registers a table schema in `database`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not exist or already holds a
    /// table with the same name.
    pub fn create_table(&self, database: &str, schema: TableSchema) -> Result<Arc<TableSchema>> {
        let mut databases = self.databases.write();
        let tables = databases.get_mut(&database.to_lowercase()).ok_or_else(|| {
            ArborError::SchemaError(format!("Database '{database}' does not exist"))
        })?;

        let key = schema.name.to_lowercase();
        if tables.contains_key(&key) {
            return Err(ArborError::SchemaError(format!(
                "Table '{}' already exists in database '{database}'",
                schema.name
            )));
        }

        let schema = Arc::new(schema);
        tables.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    /// Retrieves a table schema.
    #[must_use]
    pub fn table(&self, database: &str, name: &str) -> Option<Arc<TableSchema>> {
        self.databases
            .read()
            .get(&database.to_lowercase())
            .and_then(|tables| tables.get(&name.to_lowercase()))
            .cloned()
    }

    /// Returns the table names of a database, sorted.
    #[must_use]
    pub fn table_names(&self, database: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .databases
            .read()
            .get(&database.to_lowercase())
            .map(|tables| tables.values().map(|t| t.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Registers a function constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if a function with the same name is registered.
    pub fn register_function(&self, name: &str, constructor: FunctionConstructor) -> Result<()> {
        let mut functions = self.functions.write();
        let key = name.to_lowercase();
        if functions.contains_key(&key) {
            return Err(ArborError::FunctionError(format!(
                "Function '{name}' is already registered"
            )));
        }
        functions.insert(key, constructor);
        Ok(())
    }

    /// Retrieves a function constructor.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<FunctionConstructor> {
        self.functions.read().get(&name.to_lowercase()).copied()
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Ordered list of column definitions.
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Creates a new table schema with validation.
    ///
    /// Every column's `source` is set to the table name.
    ///
    /// # Errors
    ///
    /// Returns an error if the table has no columns or duplicate column names.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self> {
        let name = name.into();
        let columns = columns
            .into_iter()
            .map(|c| ColumnDef {
                source: name.clone(),
                ..c
            })
            .collect();
        let schema = TableSchema { name, columns };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(ArborError::SchemaError(
                "Table must have at least one column".into(),
            ));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.to_lowercase()) {
                return Err(ArborError::SchemaError(format!(
                    "Duplicate column name '{}'",
                    col.name
                )));
            }
        }

        Ok(())
    }

    /// Finds a column definition by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Finds the index of a column by name.
    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: Type,
    /// Whether the column may hold nulls.
    pub nullable: bool,
    /// Table (or derived relation) the column comes from.
    pub source: String,
}

impl ColumnDef {
    /// Creates a new nullable column definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the column name is empty.
    pub fn new(name: impl Into<String>, data_type: Type) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ArborError::SchemaError("Column name cannot be empty".into()));
        }
        Ok(ColumnDef {
            name,
            data_type,
            nullable: true,
            source: String::new(),
        })
    }

    /// Marks the column as non-nullable.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}
