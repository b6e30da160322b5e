//! Lowering of validated requests into relational queries.
//!
//! Every node kind has one rule. A rule receives the query it builds on (the
//! enclosing query, whose FROM list and filters it extends) and the scopes
//! opened by enclosing operations, and produces either a relational query or
//! a scalar expression over the relations in scope.

use tracing::trace;

use crate::catalog::Catalog;
use crate::config::DEFAULT_SUBQUERY_ALIAS;
use crate::query::{BinaryOperator, CastType, Column, Expr, Func, NameGenerator, Select};
use crate::request::{
    return_type, AggregateFunc, BinaryOp, Request, RequestKind, SortKey, UnaryOp, Value,
};
use crate::types::Type;

use super::errors::LowerError;
use super::regex::translate;
use super::scope::{Context, ScopeStack};
use super::tables::TableSet;

/// Result of lowering one node.
#[derive(Clone, Debug, PartialEq)]
pub enum Lowered {
    /// A relation.
    Query(Select),
    /// A single value.
    Scalar(Expr),
}

impl Lowered {
    /// Relation; scalars are rejected.
    pub fn into_query(self, kind: RequestKind) -> Result<Select, LowerError> {
        match self {
            Lowered::Query(query) => Ok(query),
            Lowered::Scalar(_) => Err(LowerError::NotRelational { kind }),
        }
    }
}

/// Open scopes: the lowering contexts and, in parallel, their types for
/// return-type inference.
#[derive(Clone, Debug, Default)]
struct Scopes {
    contexts: ScopeStack<Context>,
    types: ScopeStack<Type>,
}

impl Scopes {
    fn push(&self, query: Select, ty: Type) -> Self {
        Self {
            types: self.types.push(ty.clone()),
            contexts: self.contexts.push(Context { query, ty }),
        }
    }

    fn len(&self) -> usize {
        self.contexts.len()
    }

    fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Whether the rows of `value` are visible from `base` or one of the
    /// enclosing scopes.
    fn in_scope(&self, value: &Select, base: &Select) -> bool {
        value.ranges_over(base)
            || self
                .contexts
                .iter()
                .any(|context| value.ranges_over(&context.query))
    }
}

/// Columns of `value` expressed for projection by `base`. Values over rows
/// in scope contribute their sources; anything else becomes one correlated
/// sub-select per column.
fn embed(value: Select, base: &Select, scopes: &Scopes) -> Vec<Column> {
    if scopes.in_scope(&value, base) {
        return value.columns().to_vec();
    }
    let inner = value.correlate(base);
    inner
        .columns()
        .iter()
        .map(|col| {
            let select = inner.clone().with_only_columns([col.clone()]);
            Column::labeled(Expr::Subquery(Box::new(select)), col.key())
        })
        .collect()
}

/// Lowers `request` on top of `initial` with default naming.
pub fn lower<'r>(
    request: &'r Request,
    catalog: &dyn Catalog,
    tables: &TableSet<'r>,
    initial: Select,
) -> Result<Select, LowerError> {
    Lowerer::new(catalog, tables).lower(request, initial)
}

/// Per-compile lowering state.
pub struct Lowerer<'c, 'r> {
    catalog: &'c dyn Catalog,
    tables: &'c TableSet<'r>,
    names: NameGenerator,
    subquery_alias: String,
}

impl<'c, 'r> Lowerer<'c, 'r> {
    /// Lowerer resolving stored items through `tables`.
    pub fn new(catalog: &'c dyn Catalog, tables: &'c TableSet<'r>) -> Self {
        Self {
            catalog,
            tables,
            names: tables.names().clone(),
            subquery_alias: DEFAULT_SUBQUERY_ALIAS.to_owned(),
        }
    }

    /// Base name for derived-table aliases.
    pub fn with_subquery_alias(mut self, base: impl Into<String>) -> Self {
        self.subquery_alias = base.into();
        self
    }

    /// Lowers the whole request. A scalar result is projected as the single
    /// column of `initial`.
    pub fn lower(mut self, request: &'r Request, initial: Select) -> Result<Select, LowerError> {
        match self.node(request, initial.clone(), &Scopes::default())? {
            Lowered::Query(query) => Ok(query),
            Lowered::Scalar(expr) => Ok(initial.with_only_columns([Column::new(expr)])),
        }
    }

    fn infer(&self, node: &Request, scopes: &Scopes) -> Type {
        return_type(node, &scopes.types, self.catalog)
    }

    fn fresh_subquery_alias(&mut self) -> String {
        self.names.fresh(&self.subquery_alias)
    }

    /// Lowers `node` to a value usable inside a query ranging over `base`;
    /// a relation contributes its first column.
    fn scalar(
        &mut self,
        node: &'r Request,
        base: &Select,
        scopes: &Scopes,
        kind: RequestKind,
    ) -> Result<Expr, LowerError> {
        match self.node(node, base.clone(), scopes)? {
            Lowered::Scalar(expr) => Ok(expr),
            Lowered::Query(query) => embed(query, base, scopes)
                .into_iter()
                .next()
                .map(|col| col.source().clone())
                .ok_or(LowerError::EmptyProjection { kind }),
        }
    }

    fn node(
        &mut self,
        node: &'r Request,
        query: Select,
        scopes: &Scopes,
    ) -> Result<Lowered, LowerError> {
        trace!(kind = %node.kind(), scopes = scopes.len(), "compile.lower.node");
        match node {
            Request::StoredItems { table } => {
                let alias = self
                    .tables
                    .alias_for(node)
                    .ok_or_else(|| LowerError::MissingAlias {
                        table: table.clone(),
                    })?;
                // A stored relation ranges over its own rows only; outer rows
                // are reached through context references.
                let scan = Select::scan([alias]).with_only_columns(alias.columns());
                Ok(Lowered::Query(if scopes.is_empty() {
                    scan
                } else {
                    scan.apply_labels()
                }))
            }
            Request::Context { depth } => self.context(*depth, scopes),
            Request::Filter { subject, predicate } => {
                let (subject_query, element) = self.list_subject(subject, query, scopes)?;
                let inner = scopes.push(subject_query.clone(), element);
                let predicate = self.scalar(predicate, &subject_query, &inner, RequestKind::Filter)?;
                Ok(Lowered::Query(subject_query.filter(predicate)))
            }
            Request::Map { subject, new_value } => {
                let (subject_query, element) = self.list_subject(subject, query, scopes)?;
                let inner = scopes.push(subject_query.clone(), element);
                let columns = match self.node(new_value, subject_query.clone(), &inner)? {
                    Lowered::Query(mapped) => embed(mapped, &subject_query, &inner),
                    Lowered::Scalar(expr) => vec![Column::new(expr)],
                };
                Ok(Lowered::Query(subject_query.with_only_columns(columns)))
            }
            Request::Dict { fields } => {
                let mut columns = Vec::with_capacity(fields.len());
                for (key, field) in fields {
                    match self.node(field, query.clone(), scopes)? {
                        Lowered::Query(value) => {
                            let embedded = embed(value, &query, scopes);
                            if let [only] = embedded.as_slice() {
                                columns.push(Column::labeled(only.source().clone(), key.as_str()));
                            } else {
                                columns.extend(embedded.iter().map(|col| {
                                    Column::labeled(
                                        col.source().clone(),
                                        format!("{key}__{}", col.key()),
                                    )
                                }));
                            }
                        }
                        Lowered::Scalar(expr) => columns.push(Column::labeled(expr, key.as_str())),
                    }
                }
                Ok(Lowered::Query(query.with_only_columns(columns)))
            }
            Request::GroupBy {
                subject,
                key,
                aggregates,
            } => {
                let subject_query = self.node(subject, query, scopes)?.into_query(RequestKind::GroupBy)?;
                let list = self.infer(subject, scopes);
                let element = list.inner().cloned().unwrap_or_else(Type::any);
                let key_scope = scopes.push(subject_query.clone(), element);
                let key = self.scalar(key, &subject_query, &key_scope, RequestKind::GroupBy)?;
                let group_scope = scopes.push(subject_query.clone(), list);
                let summary = self.infer(aggregates, &group_scope);
                let mut columns = match self.node(aggregates, subject_query.clone(), &group_scope)? {
                    Lowered::Query(grouped) => embed(grouped, &subject_query, &group_scope),
                    Lowered::Scalar(expr) => vec![Column::new(expr)],
                };
                // Non-record summaries become a single column named `group`.
                if !summary.is_record() {
                    let first = columns.into_iter().next().ok_or(LowerError::EmptyProjection {
                        kind: RequestKind::GroupBy,
                    })?;
                    columns = vec![Column::labeled(first.source().clone(), "group")];
                }
                Ok(Lowered::Query(
                    subject_query
                        .with_only_columns(columns)
                        .group_by(key.clone())
                        .column(Column::labeled(key, "key")),
                ))
            }
            Request::Sort { subject, keys } => {
                let (subject_query, element) = self.list_subject(subject, query, scopes)?;
                let inner = scopes.push(subject_query.clone(), element);
                let mut sorted = subject_query.clone();
                for SortKey { key, descending } in keys {
                    let expr = self.scalar(key, &subject_query, &inner, RequestKind::Sort)?;
                    sorted = sorted.order_by(expr, *descending);
                }
                Ok(Lowered::Query(sorted))
            }
            Request::Slice { subject, range } => {
                let mut sliced = self.node(subject, query, scopes)?.into_query(RequestKind::Slice)?;
                let start = range.start.unwrap_or(0);
                if let Some(stop) = range.stop {
                    sliced = sliced.limit(non_negative(stop.saturating_sub(start)));
                }
                if let Some(start) = range.start {
                    sliced = sliced.offset(non_negative(start));
                }
                let alias = self.fresh_subquery_alias();
                Ok(Lowered::Query(sliced.into_subquery(alias)))
            }
            Request::One { subject } => {
                let one = self.node(subject, query, scopes)?.into_query(RequestKind::One)?;
                Ok(Lowered::Query(if scopes.is_empty() { one.limit(1) } else { one }))
            }
            Request::Aggregate { func, subject } => {
                let kind = RequestKind::from(*func);
                let list = self.node(subject, query, scopes)?.into_query(kind)?;
                let func = match func {
                    AggregateFunc::Len => {
                        return Ok(Lowered::Query(list.with_only_columns([Column::new(Expr::count())])))
                    }
                    AggregateFunc::Distinct => return Ok(Lowered::Query(list.distinct())),
                    AggregateFunc::Sum => Func::Sum,
                    AggregateFunc::Max => Func::Max,
                    AggregateFunc::Min => Func::Min,
                };
                let first = list
                    .first_column()
                    .ok_or(LowerError::EmptyProjection { kind })?
                    .source()
                    .clone();
                Ok(Lowered::Query(
                    list.with_only_columns([Column::new(Expr::call(func, first))]),
                ))
            }
            Request::Binary { op, subject, other } => self.binary(*op, subject, other, query, scopes),
            Request::Unary { op, subject } => {
                let kind = RequestKind::from(*op);
                let operand = self.scalar(subject, &query, scopes, kind)?;
                Ok(match op {
                    UnaryOp::Str => Lowered::Scalar(Expr::Cast {
                        expr: Box::new(operand),
                        ty: CastType::Text,
                    }),
                    UnaryOp::Upper => Lowered::Query(
                        query.with_only_columns([Column::new(Expr::call(Func::Upper, operand))]),
                    ),
                    UnaryOp::Lower => Lowered::Query(
                        query.with_only_columns([Column::new(Expr::call(Func::Lower, operand))]),
                    ),
                })
            }
            Request::Regex { subject, pattern } => {
                let pattern = pattern
                    .as_literal()
                    .and_then(Value::as_str)
                    .ok_or(LowerError::NonLiteralPattern)?;
                let like = translate(pattern)?;
                let text = self.scalar(subject, &query, scopes, RequestKind::Regex)?;
                Ok(Lowered::Scalar(Expr::Like {
                    expr: Box::new(text),
                    pattern: like,
                }))
            }
            Request::Literal { value } => Ok(Lowered::Scalar(Expr::Literal(value.clone()))),
            Request::Attribute { subject, name } => {
                let record = self.node(subject, query, scopes)?.into_query(RequestKind::Attribute)?;
                let source = record
                    .column_by_key(name)
                    .ok_or_else(|| LowerError::UnknownColumn { name: name.clone() })?
                    .source()
                    .clone();
                // The record's rows (and any LIMIT or ordering) stay attached.
                Ok(Lowered::Query(record.with_only_columns([Column::new(source)])))
            }
        }
    }

    fn context(&self, depth: i32, scopes: &Scopes) -> Result<Lowered, LowerError> {
        let context = scopes
            .contexts
            .resolve(depth)
            .ok_or(LowerError::UnresolvedScope {
                depth,
                available: scopes.len(),
            })?;
        if context.ty.is_list() || context.ty.is_record() {
            return Ok(Lowered::Query(context.query.clone()));
        }
        let column = context
            .query
            .first_column()
            .ok_or(LowerError::EmptyProjection {
                kind: RequestKind::ContextRef,
            })?;
        Ok(Lowered::Scalar(column.source().clone()))
    }

    /// Lowers a list subject and returns it with its element type.
    fn list_subject(
        &mut self,
        subject: &'r Request,
        query: Select,
        scopes: &Scopes,
    ) -> Result<(Select, Type), LowerError> {
        let kind = subject.kind();
        let lowered = self.node(subject, query, scopes)?.into_query(kind)?;
        let element = self
            .infer(subject, scopes)
            .inner()
            .cloned()
            .unwrap_or_else(Type::any);
        Ok((lowered, element))
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        subject: &'r Request,
        other: &'r Request,
        query: Select,
        scopes: &Scopes,
    ) -> Result<Lowered, LowerError> {
        let kind = RequestKind::from(op);
        if op == BinaryOp::Add {
            let left_ty = self.infer(subject, scopes);
            let right_ty = self.infer(other, scopes);
            if left_ty.is_record() && right_ty.is_record() {
                // The subject keeps its rows, ordering and pagination; the
                // other record's fields are merged into its projection.
                let left = self.node(subject, query.clone(), scopes)?.into_query(kind)?;
                let right = self.node(other, query.clone(), scopes)?.into_query(kind)?;
                let added = if scopes.in_scope(&right, &query) {
                    right.columns().to_vec()
                } else {
                    embed(right, &left, scopes)
                };
                let mut merged: Vec<&Column> = left.columns().iter().collect();
                merged.sort_by(|a, b| a.key().cmp(b.key()));
                let columns: Vec<Column> = added
                    .into_iter()
                    .chain(
                        merged
                            .into_iter()
                            .map(|col| Column::labeled(col.source().clone(), col.key())),
                    )
                    .collect();
                return Ok(Lowered::Query(left.with_only_columns(columns)));
            }
            if left_ty.is_list() && right_ty.is_list() {
                let left = self.node(subject, query.clone(), scopes)?.into_query(kind)?;
                let right = self.node(other, query, scopes)?.into_query(kind)?;
                let alias = self.fresh_subquery_alias();
                return Ok(Lowered::Query(left.union(right, alias)));
            }
        }

        let lhs = self.scalar(subject, &query, scopes, kind)?;
        let rhs = self.scalar(other, &query, scopes, kind)?;
        let operator = match op {
            BinaryOp::And => return Ok(Lowered::Scalar(Expr::and(lhs, rhs))),
            BinaryOp::Or => return Ok(Lowered::Scalar(Expr::or(lhs, rhs))),
            BinaryOp::Eq => BinaryOperator::Eq,
            BinaryOp::Ne => BinaryOperator::Ne,
            BinaryOp::Lt => BinaryOperator::Lt,
            BinaryOp::Gt => BinaryOperator::Gt,
            BinaryOp::Le => BinaryOperator::Le,
            BinaryOp::Ge => BinaryOperator::Ge,
            BinaryOp::Add => BinaryOperator::Add,
            BinaryOp::Sub => BinaryOperator::Sub,
            BinaryOp::Mul => BinaryOperator::Mul,
            BinaryOp::Div => BinaryOperator::Div,
        };
        Ok(Lowered::Scalar(Expr::binary(operator, lhs, rhs)))
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
