//! Compiler from a request algebra to composable relational queries.
//!
//! A [`Request`] tree (filter, map, group, sort, slice, aggregates, record
//! construction, comparisons, arithmetic, string predicates and scoped context
//! references) is compiled in three steps:
//!
//! 1. table extraction allocates one fresh alias per stored-items occurrence,
//! 2. validation rejects ill-formed requests before any query is built,
//! 3. lowering translates every node into a [`Select`] fragment.
//!
//! The resulting [`Select`] can be rendered to SQL text and handed to an
//! execution engine; nothing in this crate touches a database.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod compile;
pub mod config;
pub mod query;
pub mod request;
pub mod types;

pub use catalog::{Catalog, InMemoryCatalog, TableDef};
pub use compile::{
    CompileError, Compiled, Compiler, InvalidRequest, LowerError, Reason, ScopeStack,
};
pub use config::{CompileOptions, ConfigError};
pub use query::Select;
pub use request::{Request, Value};
pub use types::{ScalarType, Type};
