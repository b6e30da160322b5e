//! Fluent helpers for assembling request trees in Rust code.
//!
//! ```
//! use requery::request::builder::{ctx, lit, stored};
//!
//! let adults = stored("users").filter(ctx().attr("age").gt(lit(18)));
//! let names = adults.map(ctx().attr("name"));
//! # let _ = names;
//! ```

use std::collections::BTreeMap;
use std::ops;

use super::ast::{AggregateFunc, BinaryOp, Request, SliceRange, SortKey, UnaryOp};
use super::value::Value;

/// Every row of the named relation.
pub fn stored(table: impl Into<String>) -> Request {
    Request::StoredItems {
        table: table.into(),
    }
}

/// The innermost enclosing scope.
pub fn ctx() -> Request {
    ctx_at(0)
}

/// Scope reference with an explicit depth selector.
pub fn ctx_at(depth: i32) -> Request {
    Request::Context { depth }
}

/// Constant value.
pub fn lit(value: impl Into<Value>) -> Request {
    Request::Literal {
        value: value.into(),
    }
}

/// Single-row record from `(field, request)` pairs.
pub fn dict<I, K>(fields: I) -> Request
where
    I: IntoIterator<Item = (K, Request)>,
    K: Into<String>,
{
    Request::Dict {
        fields: fields
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<BTreeMap<_, _>>(),
    }
}

impl Request {
    fn binary(self, op: BinaryOp, other: Request) -> Request {
        Request::Binary {
            op,
            subject: Box::new(self),
            other: Box::new(other),
        }
    }

    fn aggregate(self, func: AggregateFunc) -> Request {
        Request::Aggregate {
            func,
            subject: Box::new(self),
        }
    }

    fn unary(self, op: UnaryOp) -> Request {
        Request::Unary {
            op,
            subject: Box::new(self),
        }
    }

    /// Keeps the elements for which `predicate` holds.
    pub fn filter(self, predicate: Request) -> Request {
        Request::Filter {
            subject: Box::new(self),
            predicate: Box::new(predicate),
        }
    }

    /// Replaces each element by `new_value`.
    pub fn map(self, new_value: Request) -> Request {
        Request::Map {
            subject: Box::new(self),
            new_value: Box::new(new_value),
        }
    }

    /// Groups elements by `key` and summarizes each group with `aggregates`.
    pub fn group_by(self, key: Request, aggregates: Request) -> Request {
        Request::GroupBy {
            subject: Box::new(self),
            key: Box::new(key),
            aggregates: Box::new(aggregates),
        }
    }

    /// Orders elements by the given keys.
    pub fn sort_by(self, keys: impl IntoIterator<Item = SortKey>) -> Request {
        Request::Sort {
            subject: Box::new(self),
            keys: keys.into_iter().collect(),
        }
    }

    /// Window `[start, stop)`.
    pub fn slice(self, start: Option<i64>, stop: Option<i64>) -> Request {
        self.slice_range(SliceRange {
            start,
            stop,
            step: None,
        })
    }

    /// Window with explicit bounds.
    pub fn slice_range(self, range: SliceRange) -> Request {
        Request::Slice {
            subject: Box::new(self),
            range,
        }
    }

    /// The single element.
    pub fn one(self) -> Request {
        Request::One {
            subject: Box::new(self),
        }
    }

    /// Number of elements.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> Request {
        self.aggregate(AggregateFunc::Len)
    }

    /// Sum of elements.
    pub fn sum(self) -> Request {
        self.aggregate(AggregateFunc::Sum)
    }

    /// Largest element.
    pub fn max(self) -> Request {
        self.aggregate(AggregateFunc::Max)
    }

    /// Smallest element.
    pub fn min(self) -> Request {
        self.aggregate(AggregateFunc::Min)
    }

    /// Elements without duplicates.
    pub fn distinct(self) -> Request {
        self.aggregate(AggregateFunc::Distinct)
    }

    /// Logical conjunction.
    pub fn and(self, other: Request) -> Request {
        self.binary(BinaryOp::And, other)
    }

    /// Logical disjunction.
    pub fn or(self, other: Request) -> Request {
        self.binary(BinaryOp::Or, other)
    }

    /// `self = other`.
    pub fn equals(self, other: Request) -> Request {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self <> other`.
    pub fn not_equals(self, other: Request) -> Request {
        self.binary(BinaryOp::Ne, other)
    }

    /// `self < other`.
    pub fn lt(self, other: Request) -> Request {
        self.binary(BinaryOp::Lt, other)
    }

    /// `self > other`.
    pub fn gt(self, other: Request) -> Request {
        self.binary(BinaryOp::Gt, other)
    }

    /// `self <= other`.
    pub fn le(self, other: Request) -> Request {
        self.binary(BinaryOp::Le, other)
    }

    /// `self >= other`.
    pub fn ge(self, other: Request) -> Request {
        self.binary(BinaryOp::Ge, other)
    }

    /// Named field of a record.
    pub fn attr(self, name: impl Into<String>) -> Request {
        Request::Attribute {
            subject: Box::new(self),
            name: name.into(),
        }
    }

    /// Conversion to text.
    pub fn to_text(self) -> Request {
        self.unary(UnaryOp::Str)
    }

    /// Upper-cased text.
    pub fn upper(self) -> Request {
        self.unary(UnaryOp::Upper)
    }

    /// Lower-cased text.
    pub fn lower(self) -> Request {
        self.unary(UnaryOp::Lower)
    }

    /// Regular-expression match against a literal pattern.
    pub fn matches(self, pattern: impl Into<String>) -> Request {
        Request::Regex {
            subject: Box::new(self),
            pattern: Box::new(lit(pattern.into())),
        }
    }
}

macro_rules! arithmetic {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Request {
            type Output = Request;

            fn $method(self, rhs: Request) -> Request {
                self.binary($op, rhs)
            }
        }
    };
}

arithmetic!(Add, add, BinaryOp::Add);
arithmetic!(Sub, sub, BinaryOp::Sub);
arithmetic!(Mul, mul, BinaryOp::Mul);
arithmetic!(Div, div, BinaryOp::Div);
