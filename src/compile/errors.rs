#![allow(missing_docs)]

use thiserror::Error;

use crate::request::{Request, RequestKind};
use crate::types::Type;

use super::regex::RegexError;

/// Why a request was rejected by validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Reason {
    /// Context depth does not select an open scope.
    #[error("context depth {depth} does not resolve within {available} open scope(s)")]
    InvalidScope { depth: i32, available: usize },
    /// Operation applied to something that is not a list.
    #[error("{operation} requires a list subject (got {found})")]
    ExpectedList { operation: RequestKind, found: Type },
    /// Attribute read from something that is not a record.
    #[error("attribute '{name}' requires a record subject (got {found})")]
    ExpectedRecord { name: String, found: Type },
    /// Attribute not present in the record.
    #[error("record has no field '{name}' (fields: {available})")]
    UnknownAttribute { name: String, available: String },
    /// Dict field evaluates to a list.
    #[error("dict field '{field}' cannot hold a list")]
    ListInRecord { field: String },
    /// Regex pattern is computed rather than written literally.
    #[error("regex pattern must be a literal string")]
    NonLiteralRegex,
    /// Regex pattern has no LIKE equivalent.
    #[error("{0}")]
    UnsupportedRegex(#[from] RegexError),
    /// Slice with a stride.
    #[error("slice step is not supported (got {step})")]
    SliceStep { step: i64 },
    /// Slice bound below zero.
    #[error("slice bounds must be non-negative (got {index})")]
    NegativeSlice { index: i64 },
    /// `one()` nested inside another scope.
    #[error("one() is only allowed at the top level")]
    NestedOne,
    /// Stored relation missing from the catalog.
    #[error("unknown table '{table}'")]
    UnknownTable { table: String },
    /// Request nesting exceeds the configured limit.
    #[error("request exceeds depth {max}")]
    TooDeep { max: usize },
    /// Request exceeds the configured node budget.
    #[error("request exceeds {max} nodes (got {nodes})")]
    TooLarge { nodes: usize, max: usize },
}

impl Reason {
    /// Returns a machine-readable code for the reason.
    pub fn code(&self) -> &'static str {
        match self {
            Reason::InvalidScope { .. } => "InvalidScope",
            Reason::ExpectedList { .. } => "ExpectedList",
            Reason::ExpectedRecord { .. } => "ExpectedRecord",
            Reason::UnknownAttribute { .. } => "UnknownAttribute",
            Reason::ListInRecord { .. } => "ListInRecord",
            Reason::NonLiteralRegex => "NonLiteralRegex",
            Reason::UnsupportedRegex(_) => "UnsupportedRegex",
            Reason::SliceStep { .. } => "SliceStep",
            Reason::NegativeSlice { .. } => "NegativeSlice",
            Reason::NestedOne => "NestedOne",
            Reason::UnknownTable { .. } => "UnknownTable",
            Reason::TooDeep { .. } => "TooDeep",
            Reason::TooLarge { .. } => "TooLarge",
        }
    }
}

/// A request rejected by validation, with the offending subtree.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("[{}] {reason} (in {})", .reason.code(), .node.kind())]
pub struct InvalidRequest {
    /// Subtree that failed.
    pub node: Box<Request>,
    /// Why it failed.
    pub reason: Reason,
}

impl InvalidRequest {
    /// Builds a failure for `node`.
    pub fn new(node: &Request, reason: impl Into<Reason>) -> Self {
        Self {
            node: Box::new(node.clone()),
            reason: reason.into(),
        }
    }

    /// Returns the reason's machine-readable code.
    pub fn code(&self) -> &'static str {
        self.reason.code()
    }
}

/// Lowering reached a state validation rules out.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LowerError {
    #[error("no alias was allocated for stored items of '{table}'")]
    MissingAlias { table: String },
    #[error("context depth {depth} does not resolve within {available} open scope(s)")]
    UnresolvedScope { depth: i32, available: usize },
    #[error("lowered query has no column '{name}'")]
    UnknownColumn { name: String },
    #[error("{kind} requires a relational operand")]
    NotRelational { kind: RequestKind },
    #[error("{kind} operand projects no columns")]
    EmptyProjection { kind: RequestKind },
    #[error("regex pattern is not a literal string")]
    NonLiteralPattern,
    #[error(transparent)]
    Regex(#[from] RegexError),
}

impl LowerError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            LowerError::MissingAlias { .. } => "MissingAlias",
            LowerError::UnresolvedScope { .. } => "UnresolvedScope",
            LowerError::UnknownColumn { .. } => "UnknownColumn",
            LowerError::NotRelational { .. } => "NotRelational",
            LowerError::EmptyProjection { .. } => "EmptyProjection",
            LowerError::NonLiteralPattern => "NonLiteralRegex",
            LowerError::Regex(_) => "UnsupportedRegex",
        }
    }
}

/// Failure of a full compile.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),
    #[error("lowering failed: {0}")]
    Lower(#[from] LowerError),
}

impl CompileError {
    /// Returns a machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Invalid(err) => err.code(),
            CompileError::Lower(err) => err.code(),
        }
    }
}
