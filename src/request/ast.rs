//! Abstract syntax tree of the request algebra.
//!
//! A request is an immutable tree. The compiler borrows it for the whole
//! compile and never annotates nodes; per-compile facts such as table aliases
//! are kept in side tables keyed by node identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A node of the request algebra.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Every row of a stored relation.
    StoredItems {
        /// Name of the relation, resolved through the catalog.
        table: String,
    },
    /// Reference to an enclosing scope.
    ///
    /// Positive depths count from the outermost scope (`1` is the outermost);
    /// zero and negative depths count back from the innermost scope (`0` is
    /// the innermost, `-1` its parent).
    Context {
        /// Scope selector.
        #[serde(default)]
        depth: i32,
    },
    /// Rows of `subject` for which `predicate` holds.
    Filter {
        /// List being filtered.
        subject: Box<Request>,
        /// Predicate evaluated with each element in scope.
        predicate: Box<Request>,
    },
    /// `new_value` evaluated for each element of `subject`.
    Map {
        /// List being mapped.
        subject: Box<Request>,
        /// Mapping evaluated with each element in scope.
        new_value: Box<Request>,
    },
    /// Single-row record built from named sub-requests.
    Dict {
        /// Field requests keyed by field name.
        fields: BTreeMap<String, Request>,
    },
    /// Groups of `subject` sharing the same `key`, summarized by `aggregates`.
    GroupBy {
        /// List being grouped.
        subject: Box<Request>,
        /// Grouping key evaluated with each element in scope.
        key: Box<Request>,
        /// Summary evaluated with the whole group in scope.
        aggregates: Box<Request>,
    },
    /// `subject` ordered by `keys` in precedence order.
    Sort {
        /// List being sorted.
        subject: Box<Request>,
        /// Ordering keys, most significant first.
        keys: Vec<SortKey>,
    },
    /// Contiguous window of `subject`.
    Slice {
        /// List being sliced.
        subject: Box<Request>,
        /// Window bounds.
        #[serde(default)]
        range: SliceRange,
    },
    /// The single element of `subject`.
    One {
        /// List holding one element.
        subject: Box<Request>,
    },
    /// Aggregate function over a list.
    Aggregate {
        /// Function applied.
        func: AggregateFunc,
        /// List aggregated.
        subject: Box<Request>,
    },
    /// Binary operator.
    Binary {
        /// Operator applied.
        op: BinaryOp,
        /// Left operand.
        subject: Box<Request>,
        /// Right operand.
        other: Box<Request>,
    },
    /// Unary string operator.
    Unary {
        /// Operator applied.
        op: UnaryOp,
        /// Operand.
        subject: Box<Request>,
    },
    /// Match of `subject` against a regular expression.
    Regex {
        /// Text being matched.
        subject: Box<Request>,
        /// Pattern; must be a literal string.
        pattern: Box<Request>,
    },
    /// Constant value.
    Literal {
        /// The constant.
        value: Value,
    },
    /// Named field of a record.
    Attribute {
        /// Record holding the field.
        subject: Box<Request>,
        /// Field name.
        name: String,
    },
}

/// One ordering key of a [`Request::Sort`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// Key evaluated with each element in scope.
    pub key: Request,
    /// Sort from largest to smallest.
    #[serde(default)]
    pub descending: bool,
}

impl SortKey {
    /// Ascending key.
    pub fn asc(key: Request) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    /// Descending key.
    pub fn desc(key: Request) -> Self {
        Self {
            key,
            descending: true,
        }
    }
}

/// Bounds of a [`Request::Slice`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceRange {
    /// First included index.
    pub start: Option<i64>,
    /// First excluded index.
    pub stop: Option<i64>,
    /// Stride; only the absent stride is supported.
    pub step: Option<i64>,
}

/// Aggregate functions over lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunc {
    /// Number of elements.
    Len,
    /// Sum of elements.
    Sum,
    /// Largest element.
    Max,
    /// Smallest element.
    Min,
    /// Elements with duplicates removed.
    Distinct,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Comparison operators produce booleans from arbitrary scalars.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }
}

/// Unary string operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Conversion to text.
    Str,
    /// Upper-casing.
    Upper,
    /// Lower-casing.
    Lower,
}

/// Flat name of every request kind, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RequestKind {
    StoredItems,
    ContextRef,
    Filter,
    Map,
    Dict,
    GroupBy,
    Sort,
    Slice,
    One,
    Len,
    Sum,
    Max,
    Min,
    Distinct,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Str,
    Upper,
    Lower,
    Regex,
    Literal,
    Attribute,
}

impl RequestKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            RequestKind::StoredItems => "StoredItems",
            RequestKind::ContextRef => "ContextRef",
            RequestKind::Filter => "Filter",
            RequestKind::Map => "Map",
            RequestKind::Dict => "Dict",
            RequestKind::GroupBy => "GroupBy",
            RequestKind::Sort => "Sort",
            RequestKind::Slice => "Slice",
            RequestKind::One => "One",
            RequestKind::Len => "Len",
            RequestKind::Sum => "Sum",
            RequestKind::Max => "Max",
            RequestKind::Min => "Min",
            RequestKind::Distinct => "Distinct",
            RequestKind::And => "And",
            RequestKind::Or => "Or",
            RequestKind::Eq => "Eq",
            RequestKind::Ne => "Ne",
            RequestKind::Lt => "Lt",
            RequestKind::Gt => "Gt",
            RequestKind::Le => "Le",
            RequestKind::Ge => "Ge",
            RequestKind::Add => "Add",
            RequestKind::Sub => "Sub",
            RequestKind::Mul => "Mul",
            RequestKind::Div => "Div",
            RequestKind::Str => "Str",
            RequestKind::Upper => "Upper",
            RequestKind::Lower => "Lower",
            RequestKind::Regex => "Regex",
            RequestKind::Literal => "Literal",
            RequestKind::Attribute => "Attribute",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AggregateFunc> for RequestKind {
    fn from(func: AggregateFunc) -> Self {
        match func {
            AggregateFunc::Len => RequestKind::Len,
            AggregateFunc::Sum => RequestKind::Sum,
            AggregateFunc::Max => RequestKind::Max,
            AggregateFunc::Min => RequestKind::Min,
            AggregateFunc::Distinct => RequestKind::Distinct,
        }
    }
}

impl From<BinaryOp> for RequestKind {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::And => RequestKind::And,
            BinaryOp::Or => RequestKind::Or,
            BinaryOp::Eq => RequestKind::Eq,
            BinaryOp::Ne => RequestKind::Ne,
            BinaryOp::Lt => RequestKind::Lt,
            BinaryOp::Gt => RequestKind::Gt,
            BinaryOp::Le => RequestKind::Le,
            BinaryOp::Ge => RequestKind::Ge,
            BinaryOp::Add => RequestKind::Add,
            BinaryOp::Sub => RequestKind::Sub,
            BinaryOp::Mul => RequestKind::Mul,
            BinaryOp::Div => RequestKind::Div,
        }
    }
}

impl From<UnaryOp> for RequestKind {
    fn from(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Str => RequestKind::Str,
            UnaryOp::Upper => RequestKind::Upper,
            UnaryOp::Lower => RequestKind::Lower,
        }
    }
}

impl Request {
    /// Kind of this node.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::StoredItems { .. } => RequestKind::StoredItems,
            Request::Context { .. } => RequestKind::ContextRef,
            Request::Filter { .. } => RequestKind::Filter,
            Request::Map { .. } => RequestKind::Map,
            Request::Dict { .. } => RequestKind::Dict,
            Request::GroupBy { .. } => RequestKind::GroupBy,
            Request::Sort { .. } => RequestKind::Sort,
            Request::Slice { .. } => RequestKind::Slice,
            Request::One { .. } => RequestKind::One,
            Request::Aggregate { func, .. } => (*func).into(),
            Request::Binary { op, .. } => (*op).into(),
            Request::Unary { op, .. } => (*op).into(),
            Request::Regex { .. } => RequestKind::Regex,
            Request::Literal { .. } => RequestKind::Literal,
            Request::Attribute { .. } => RequestKind::Attribute,
        }
    }

    /// Direct children in traversal order: subject first, then the remaining
    /// operands in declaration order; dict fields in sorted key order.
    pub fn children(&self) -> Vec<&Request> {
        match self {
            Request::StoredItems { .. } | Request::Context { .. } | Request::Literal { .. } => {
                Vec::new()
            }
            Request::Filter { subject, predicate } => vec![subject.as_ref(), predicate.as_ref()],
            Request::Map { subject, new_value } => vec![subject.as_ref(), new_value.as_ref()],
            Request::Dict { fields } => fields.values().collect(),
            Request::GroupBy {
                subject,
                key,
                aggregates,
            } => vec![subject.as_ref(), key.as_ref(), aggregates.as_ref()],
            Request::Sort { subject, keys } => {
                let mut out = Vec::with_capacity(keys.len() + 1);
                out.push(subject.as_ref());
                out.extend(keys.iter().map(|k| &k.key));
                out
            }
            Request::Slice { subject, .. }
            | Request::One { subject }
            | Request::Aggregate { subject, .. }
            | Request::Unary { subject, .. }
            | Request::Attribute { subject, .. } => vec![subject.as_ref()],
            Request::Binary { subject, other, .. } => vec![subject.as_ref(), other.as_ref()],
            Request::Regex { subject, pattern } => vec![subject.as_ref(), pattern.as_ref()],
        }
    }

    /// Literal value if this node is a constant.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Request::Literal { value } => Some(value),
            _ => None,
        }
    }
}
