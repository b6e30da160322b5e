//! Static return-type inference for request nodes.
//!
//! Inference is total: anything it cannot determine (an unknown table, an
//! unresolved scope, a missing field) becomes [`ScalarType::Any`]. Rejecting
//! such requests is the validator's job.

use crate::catalog::Catalog;
use crate::compile::scope::ScopeStack;
use crate::types::{ScalarType, Type};

use super::ast::{AggregateFunc, BinaryOp, Request};

/// Infers the type a request evaluates to under `scopes`.
pub fn return_type(request: &Request, scopes: &ScopeStack<Type>, catalog: &dyn Catalog) -> Type {
    let infer = |node: &Request| return_type(node, scopes, catalog);
    match request {
        Request::StoredItems { table } => Type::list(
            catalog
                .table(table)
                .map(|def| def.row_type())
                .unwrap_or_else(Type::any),
        ),
        Request::Context { depth } => scopes.resolve(*depth).cloned().unwrap_or_else(Type::any),
        Request::Filter { subject, .. }
        | Request::Sort { subject, .. }
        | Request::Slice { subject, .. } => infer(subject),
        Request::Map { subject, new_value } => {
            let element = element_type(&infer(subject));
            Type::list(return_type(new_value, &scopes.push(element), catalog))
        }
        Request::Dict { fields } => Type::Record(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), infer(field)))
                .collect(),
        ),
        Request::GroupBy {
            subject,
            key,
            aggregates,
        } => {
            let list = infer(subject);
            let key_ty = return_type(key, &scopes.push(element_type(&list)), catalog);
            let agg_ty = return_type(aggregates, &scopes.push(list), catalog);
            let mut fields = match agg_ty {
                Type::Record(fields) => fields,
                other => [("group".to_owned(), other)].into_iter().collect(),
            };
            fields.insert("key".to_owned(), key_ty);
            Type::list(Type::Record(fields))
        }
        Request::One { subject } => element_type(&infer(subject)),
        Request::Aggregate { func, subject } => {
            let list = infer(subject);
            match func {
                AggregateFunc::Len => Type::Scalar(ScalarType::Int),
                AggregateFunc::Distinct => list,
                AggregateFunc::Sum => {
                    let scalar = element_scalar(&list);
                    Type::Scalar(scalar.numeric_join(scalar))
                }
                AggregateFunc::Max | AggregateFunc::Min => Type::Scalar(element_scalar(&list)),
            }
        }
        Request::Binary { op, subject, other } => {
            binary_type(*op, infer(subject), infer(other))
        }
        Request::Unary { .. } => Type::Scalar(ScalarType::Text),
        Request::Regex { .. } => Type::Scalar(ScalarType::Bool),
        Request::Literal { value } => value.ty(),
        Request::Attribute { subject, name } => infer(subject)
            .field(name)
            .cloned()
            .unwrap_or_else(Type::any),
    }
}

fn element_type(ty: &Type) -> Type {
    ty.inner().cloned().unwrap_or_else(Type::any)
}

fn element_scalar(ty: &Type) -> ScalarType {
    ty.inner()
        .and_then(Type::scalar)
        .unwrap_or(ScalarType::Any)
}

fn binary_type(op: BinaryOp, lhs: Type, rhs: Type) -> Type {
    match op {
        BinaryOp::And | BinaryOp::Or => Type::Scalar(ScalarType::Bool),
        op if op.is_comparison() => Type::Scalar(ScalarType::Bool),
        BinaryOp::Add => match (lhs, rhs) {
            (Type::Record(left), Type::Record(mut merged)) => {
                merged.extend(left);
                Type::Record(merged)
            }
            (list @ Type::List(_), Type::List(_)) => list,
            (lhs, rhs) => scalar_arithmetic(&lhs, &rhs, true),
        },
        _ => scalar_arithmetic(&lhs, &rhs, false),
    }
}

fn scalar_arithmetic(lhs: &Type, rhs: &Type, concat: bool) -> Type {
    let left = lhs.scalar().unwrap_or(ScalarType::Any);
    let right = rhs.scalar().unwrap_or(ScalarType::Any);
    if concat && left == ScalarType::Text && right == ScalarType::Text {
        return Type::Scalar(ScalarType::Text);
    }
    Type::Scalar(left.numeric_join(right))
}
