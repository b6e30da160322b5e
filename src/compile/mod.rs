#![forbid(unsafe_code)]

//! Request compilation.
//!
//! A compile runs validation, table extraction and lowering in that order.
//! Validation completes before anything else starts, so a rejected request
//! never produces aliases or a partial query, and the depth and node limits
//! bound every later pass.

/// Error types for validation, lowering and the compile driver.
pub mod errors;

/// Node-by-node translation into relational queries.
pub mod lower;

/// Regex to LIKE pattern translation.
pub mod regex;

/// Persistent scope stacks for context resolution.
pub mod scope;

/// Table-dependency extraction and alias allocation.
pub mod tables;

/// Type-directed validation.
pub mod validate;

use std::cell::OnceCell;
use std::fmt;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::config::CompileOptions;
use crate::query::{NameGenerator, Select, TableAlias};
use crate::request::Request;

pub use errors::{CompileError, InvalidRequest, LowerError, Reason};
pub use lower::{lower, Lowered, Lowerer};
pub use regex::{translate, RegexError};
pub use scope::{Context, ScopeStack};
pub use tables::{extract_tables, TableSet};
pub use validate::validate;

/// Result type for compiles.
pub type CompileResult<T> = Result<T, CompileError>;

/// Compiles requests against one catalog.
pub struct Compiler<'c> {
    catalog: &'c dyn Catalog,
    options: CompileOptions,
}

impl<'c> Compiler<'c> {
    /// Compiler with default options.
    pub fn new(catalog: &'c dyn Catalog) -> Self {
        Self {
            catalog,
            options: CompileOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Starts a step-by-step compile of `request`.
    pub fn compilation<'r>(&self, request: &'r Request) -> Compilation<'_, 'r> {
        Compilation {
            catalog: self.catalog,
            options: &self.options,
            request,
            tables: OnceCell::new(),
        }
    }

    /// Compiles `request` into a query.
    pub fn compile(&self, request: &Request) -> CompileResult<Compiled> {
        self.compilation(request).run()
    }
}

/// State of one compile. Table extraction is memoized, so every step sees
/// the same aliases.
pub struct Compilation<'c, 'r> {
    catalog: &'c dyn Catalog,
    options: &'c CompileOptions,
    request: &'r Request,
    tables: OnceCell<TableSet<'r>>,
}

impl<'c, 'r> Compilation<'c, 'r> {
    /// The request being compiled.
    pub fn request(&self) -> &'r Request {
        self.request
    }

    /// Aliases for every stored-items occurrence, extracted on first use.
    pub fn tables(&self) -> Result<&TableSet<'r>, InvalidRequest> {
        if let Some(set) = self.tables.get() {
            return Ok(set);
        }
        let set = extract_tables(self.request, self.catalog, NameGenerator::new())
            .map_err(rejected)?;
        debug!(aliases = set.len(), "compile.tables.extracted");
        Ok(self.tables.get_or_init(|| set))
    }

    /// Query the top-level request is lowered on. It has no relations;
    /// each stored-items node brings its own alias.
    pub fn initial_query(&self) -> Select {
        Select::default()
    }

    /// Validates the request at the top level.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        validate(self.request, self.catalog, self.options).map_err(rejected)
    }

    /// Lowers the request on top of `initial`. Callers validate first.
    pub fn lower(&self, initial: Select) -> CompileResult<Select> {
        let tables = self.tables()?;
        Lowerer::new(self.catalog, tables)
            .with_subquery_alias(self.options.subquery_alias.as_str())
            .lower(self.request, initial)
            .map_err(|err| {
                warn!(code = err.code(), error = %err, "compile.lower.failed");
                CompileError::from(err)
            })
    }

    /// Validates, extracts and lowers.
    pub fn run(&self) -> CompileResult<Compiled> {
        self.validate()?;
        let tables = self.tables()?;
        let select = self.lower(self.initial_query())?;
        debug!(
            kind = %self.request.kind(),
            aliases = tables.len(),
            "compile.lower.completed"
        );
        Ok(Compiled {
            select,
            aliases: tables.aliases().to_vec(),
        })
    }
}

fn rejected(err: InvalidRequest) -> InvalidRequest {
    debug!(code = err.code(), kind = %err.node.kind(), "compile.validate.rejected");
    err
}

/// A compiled request.
#[derive(Clone, Debug, PartialEq)]
pub struct Compiled {
    select: Select,
    aliases: Vec<TableAlias>,
}

impl Compiled {
    /// The compiled query.
    pub fn select(&self) -> &Select {
        &self.select
    }

    /// Consumes the result, returning the query.
    pub fn into_select(self) -> Select {
        self.select
    }

    /// Aliases of the base relations, in extraction order.
    pub fn aliases(&self) -> &[TableAlias] {
        &self.aliases
    }

    /// SQL text of the query.
    pub fn to_sql(&self) -> String {
        self.select.to_sql()
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.select, f)
    }
}
