//! Table catalog bridging stored-items requests to physical relations.
//!
//! Requests name their base relations by table name. The compiler resolves
//! those names through a [`Catalog`] once per compile to learn the column set
//! (for projection) and the row type (for inference).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::{ScalarType, Type};

/// Definition of a base relation: its name and typed columns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableDef {
    name: String,
    columns: BTreeMap<String, ScalarType>,
}

impl TableDef {
    /// Creates a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Adds a column.
    pub fn with_column(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }

    /// Table name as known to the backing store.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns sorted by name.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ScalarType)> + '_ {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Record type of a single row.
    pub fn row_type(&self) -> Type {
        Type::Record(
            self.columns
                .iter()
                .map(|(name, ty)| (name.clone(), Type::Scalar(*ty)))
                .collect(),
        )
    }
}

/// Resolves table names to their definitions.
pub trait Catalog {
    /// Looks up a table by name.
    fn table(&self, name: &str) -> Option<Arc<TableDef>>;
}

/// Simple in-memory catalog used for tests or embedding.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    tables: HashMap<String, Arc<TableDef>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table definition, replacing any table of the same name.
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables
            .insert(table.name().to_owned(), Arc::new(table));
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn table(&self, name: &str) -> Option<Arc<TableDef>> {
        self.tables.get(name).cloned()
    }
}
