//! Static type descriptors attached to requests.
//!
//! Every request node has a statically inferred [`Type`]; the validator and
//! the lowerer dispatch on it (the same `+` is a field merge, a set union or
//! numeric addition depending on operand types).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar column types understood by the compiler.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Type could not be determined statically.
    Any,
    /// The null literal.
    Null,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// UTF-8 text.
    Text,
}

impl ScalarType {
    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Any => "any",
            ScalarType::Null => "null",
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Text => "text",
        }
    }

    /// Result type of an arithmetic operation over two scalars.
    pub fn numeric_join(self, other: ScalarType) -> ScalarType {
        match (self, other) {
            (ScalarType::Int, ScalarType::Int) => ScalarType::Int,
            (ScalarType::Float, ScalarType::Int | ScalarType::Float)
            | (ScalarType::Int, ScalarType::Float) => ScalarType::Float,
            _ => ScalarType::Any,
        }
    }
}

/// Type descriptor: a scalar, a homogeneous list, or a record of named fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "lowercase")]
pub enum Type {
    /// Single value.
    Scalar(ScalarType),
    /// Ordered collection of elements of the inner type.
    List(Box<Type>),
    /// Named fields, kept sorted by name.
    Record(BTreeMap<String, Type>),
}

impl Type {
    /// The unknown scalar type.
    pub fn any() -> Self {
        Type::Scalar(ScalarType::Any)
    }

    /// Builds a list type.
    pub fn list(inner: Type) -> Self {
        Type::List(Box::new(inner))
    }

    /// Builds a record type from `(name, type)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns `true` for list types.
    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    /// Returns `true` for record types.
    pub fn is_record(&self) -> bool {
        matches!(self, Type::Record(_))
    }

    /// Element type of a list.
    pub fn inner(&self) -> Option<&Type> {
        match self {
            Type::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Fields of a record.
    pub fn fields(&self) -> Option<&BTreeMap<String, Type>> {
        match self {
            Type::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Type of a single record field.
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Scalar carried by this type, looking through single-field records.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Type::Scalar(scalar) => Some(*scalar),
            Type::Record(fields) if fields.len() == 1 => {
                fields.values().next().and_then(Type::scalar)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(scalar) => f.write_str(scalar.name()),
            Type::List(inner) => write!(f, "list<{inner}>"),
            Type::Record(fields) => {
                f.write_str("record{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str("}")
            }
        }
    }
}
