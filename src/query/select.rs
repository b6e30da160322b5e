//! Composable relational query value.
//!
//! A [`Select`] is consumed and returned by value along the lowering chain:
//! every builder method takes `self` and yields the extended query.

use super::alias::TableAlias;
use super::expr::{ColumnRef, Expr};

/// Projected output column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    expr: Expr,
    key: String,
    label: Option<String>,
}

impl Column {
    /// Unlabeled column keyed by the expression's natural name.
    pub fn new(expr: Expr) -> Self {
        let key = expr.natural_name().to_owned();
        Self {
            expr,
            key,
            label: None,
        }
    }

    /// Column rendered as `expr AS label` and keyed by the label.
    pub fn labeled(expr: Expr, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            expr,
            key: label.clone(),
            label: Some(label),
        }
    }

    /// Logical name used for attribute lookup.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rendered label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Name of this column in the query's output.
    pub fn output_name(&self) -> &str {
        self.label
            .as_deref()
            .unwrap_or_else(|| self.expr.natural_name())
    }

    /// The projected expression without its output label, expressed over
    /// the relations of the query's FROM list.
    pub fn source(&self) -> &Expr {
        &self.expr
    }
}

/// ORDER BY entry.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    /// Sort expression.
    pub expr: Expr,
    /// Largest first.
    pub descending: bool,
}

/// Entry of the FROM list.
#[derive(Clone, Debug, PartialEq)]
pub enum Relation {
    /// Aliased base table.
    Table(TableAlias),
    /// Aliased sub-select.
    Derived {
        /// Alias of the derived table.
        alias: String,
        /// Body producing its rows.
        body: Box<SetExpr>,
    },
}

impl Relation {
    /// Alias this relation is referenced by.
    pub fn name(&self) -> &str {
        match self {
            Relation::Table(alias) => alias.name(),
            Relation::Derived { alias, .. } => alias,
        }
    }
}

/// Body of a derived table.
#[derive(Clone, Debug, PartialEq)]
pub enum SetExpr {
    /// Plain select.
    Select(Select),
    /// Set union of the member selects.
    Union(Vec<Select>),
}

/// Relational query: projection, FROM list, conjunctive filter, grouping,
/// ordering and pagination.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    columns: Vec<Column>,
    from: Vec<Relation>,
    filter: Vec<Expr>,
    group_by: Vec<Expr>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

impl Select {
    /// Query over the cross product of `aliases` projecting nothing yet.
    pub fn scan<'a>(aliases: impl IntoIterator<Item = &'a TableAlias>) -> Self {
        Self {
            from: aliases.into_iter().cloned().map(Relation::Table).collect(),
            ..Self::default()
        }
    }

    /// Projected columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First projected column.
    pub fn first_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    /// FROM list.
    pub fn relations(&self) -> &[Relation] {
        &self.from
    }

    /// WHERE conjuncts.
    pub fn conditions(&self) -> &[Expr] {
        &self.filter
    }

    /// GROUP BY expressions.
    pub fn grouping(&self) -> &[Expr] {
        &self.group_by
    }

    /// ORDER BY entries.
    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// LIMIT, if any.
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// OFFSET, if any.
    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether duplicates are removed.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Column whose logical key is `key`; later columns shadow earlier ones.
    pub fn column_by_key(&self, key: &str) -> Option<&Column> {
        self.columns.iter().rev().find(|col| col.key() == key)
    }

    /// Replaces the projection.
    #[must_use]
    pub fn with_only_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Appends a projected column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// AND-combines `predicate` into the WHERE clause.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        let terms = match predicate {
            Expr::And(terms) => terms,
            other => vec![other],
        };
        for term in terms {
            if !self.filter.contains(&term) {
                self.filter.push(term);
            }
        }
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    /// Adds an ORDER BY entry after the existing ones.
    #[must_use]
    pub fn order_by(mut self, expr: Expr, descending: bool) -> Self {
        self.order_by.push(OrderBy { expr, descending });
        self
    }

    /// Removes duplicate rows.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Labels every plain column reference `<relation>_<column>` so columns
    /// of different relations never share an output name. Logical keys are
    /// kept for attribute lookup.
    #[must_use]
    pub fn apply_labels(mut self) -> Self {
        for col in &mut self.columns {
            if let Expr::Column(ColumnRef { relation, name }) = &col.expr {
                col.label = Some(format!("{relation}_{name}"));
            }
        }
        self
    }

    /// Wraps the query as derived table `alias` and selects all of its
    /// columns from it.
    #[must_use]
    pub fn into_subquery(self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let (inner, columns) = self.name_outputs(&alias);
        Self {
            columns,
            from: vec![Relation::Derived {
                alias,
                body: Box::new(SetExpr::Select(inner)),
            }],
            ..Self::default()
        }
    }

    /// Set union of `self` and `other` as derived table `alias`, projecting
    /// the columns of `self`.
    #[must_use]
    pub fn union(self, other: Select, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let (left, columns) = self.name_outputs(&alias);
        let (right, _) = other.name_outputs(&alias);
        Self {
            columns,
            from: vec![Relation::Derived {
                alias,
                body: Box::new(SetExpr::Union(vec![left, right])),
            }],
            ..Self::default()
        }
    }

    /// Returns `true` when `self` ranges over the same rows as `base`, so
    /// its columns can be projected by `base` directly.
    pub fn ranges_over(&self, base: &Select) -> bool {
        self.from == base.from
            && self.filter == base.filter
            && self.group_by == base.group_by
            && self.order_by == base.order_by
            && self.limit == base.limit
            && self.offset == base.offset
            && self.distinct == base.distinct
    }

    /// Prepares the query for embedding as a dependent sub-select of
    /// `outer`: relations and conjuncts `outer` already provides are dropped,
    /// so references to them bind to the enclosing row.
    #[must_use]
    pub fn correlate(mut self, outer: &Select) -> Self {
        self.from
            .retain(|relation| !outer.from.iter().any(|r| r.name() == relation.name()));
        self.filter.retain(|term| !outer.filter.contains(term));
        self
    }

    /// Gives every inner column an output name and builds the matching outer
    /// column references.
    fn name_outputs(mut self, alias: &str) -> (Select, Vec<Column>) {
        let mut outer = Vec::with_capacity(self.columns.len());
        for col in &mut self.columns {
            if col.label.is_none() && !matches!(col.expr, Expr::Column(_)) {
                col.label = Some(col.key.clone());
            }
            outer.push(Column {
                expr: Expr::column(alias, col.output_name()),
                key: col.key.clone(),
                label: None,
            });
        }
        (self, outer)
    }
}
