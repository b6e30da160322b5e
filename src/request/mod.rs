//! Request algebra: node definitions, literal values, construction helpers
//! and static type inference.

pub mod ast;
pub mod builder;
pub mod infer;
pub mod value;

pub use ast::{
    AggregateFunc, BinaryOp, Request, RequestKind, SliceRange, SortKey, UnaryOp,
};
pub use infer::return_type;
pub use value::Value;

impl Request {
    /// Parses a request from its JSON encoding.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Encodes the request as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
