#![forbid(unsafe_code)]

//! Relational query model produced by the compiler.

/// Compile-scoped relation aliases and the name generator.
pub mod alias;

/// Scalar expressions.
pub mod expr;

/// SQL text rendering.
pub mod render;

/// The composable [`Select`] query value.
pub mod select;

pub use alias::{NameGenerator, TableAlias};
pub use expr::{BinaryOperator, CastType, ColumnRef, Expr, Func};
pub use select::{Column, OrderBy, Relation, Select, SetExpr};
