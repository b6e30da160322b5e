//! Compile-scoped names for relations.

use std::sync::Arc;

use crate::catalog::TableDef;

use super::expr::Expr;
use super::select::Column;

/// Fresh named reference to a base relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableAlias {
    table: Arc<TableDef>,
    name: String,
}

impl TableAlias {
    /// Binds `name` to `table`.
    pub fn new(table: Arc<TableDef>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }

    /// Alias used in the query text.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The aliased relation.
    pub fn table(&self) -> &TableDef {
        &self.table
    }

    /// Every column of the relation, sorted by name and labeled by name.
    pub fn columns(&self) -> Vec<Column> {
        self.table
            .columns()
            .map(|(column, _)| Column::labeled(Expr::column(self.name.as_str(), column), column))
            .collect()
    }
}

/// Per-compile generator of `<base>_<n>` names. One counter is shared by
/// every base so names never collide within a compile.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    issued: usize,
}

impl NameGenerator {
    /// Generator whose first name ends in `_1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused name.
    pub fn fresh(&mut self, base: &str) -> String {
        self.issued += 1;
        format!("{base}_{}", self.issued)
    }

    /// Number of names handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}
