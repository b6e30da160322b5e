//! Deterministic SQL text for compiled queries.

use std::fmt::{self, Display, Formatter};

use crate::request::Value;

use super::expr::{CastType, ColumnRef, Expr};
use super::select::{Column, OrderBy, Relation, Select, SetExpr};

const RESERVED: &[&str] = &[
    "and", "as", "by", "distinct", "false", "from", "group", "like", "limit", "not", "null",
    "offset", "or", "order", "select", "table", "true", "union", "user", "where",
];

impl Select {
    /// Renders the query as SQL.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.is_distinct() {
            f.write_str("DISTINCT ")?;
        }
        if self.columns().is_empty() {
            f.write_str("*")?;
        } else {
            join(f, self.columns(), ", ")?;
        }
        if !self.relations().is_empty() {
            f.write_str(" FROM ")?;
            join(f, self.relations(), ", ")?;
        }
        if !self.conditions().is_empty() {
            f.write_str(" WHERE ")?;
            let terms: Vec<Term<'_>> = self.conditions().iter().map(Term).collect();
            join(f, &terms, " AND ")?;
        }
        if !self.grouping().is_empty() {
            f.write_str(" GROUP BY ")?;
            join(f, self.grouping(), ", ")?;
        }
        if !self.ordering().is_empty() {
            f.write_str(" ORDER BY ")?;
            join(f, self.ordering(), ", ")?;
        }
        if let Some(limit) = self.limit_value() {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset_value() {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())?;
        if let Some(label) = self.label() {
            let implied = matches!(self.source(), Expr::Column(col) if col.name == label);
            if !implied {
                write!(f, " AS {}", Ident(label))?;
            }
        }
        Ok(())
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Table(alias) => write!(
                f,
                "{} AS {}",
                Ident(alias.table().name()),
                Ident(alias.name())
            ),
            Relation::Derived { alias, body } => write!(f, "({body}) AS {}", Ident(alias)),
        }
    }
}

impl Display for SetExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SetExpr::Select(select) => select.fmt(f),
            SetExpr::Union(members) => join(f, members, " UNION "),
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "DESC" } else { "ASC" };
        write!(f, "{} {direction}", self.expr)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(ColumnRef { relation, name }) => {
                write!(f, "{}.{}", Ident(relation), Ident(name))
            }
            Expr::Literal(value) => write_literal(f, value),
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "{} {} {}", Grouped(lhs), op.symbol(), Grouped(rhs))
            }
            Expr::And(terms) => {
                let terms: Vec<Term<'_>> = terms.iter().map(Term).collect();
                join(f, &terms, " AND ")
            }
            Expr::Or(terms) => {
                let terms: Vec<Term<'_>> = terms.iter().map(Term).collect();
                join(f, &terms, " OR ")
            }
            Expr::Func { func, args } => {
                write!(f, "{}(", func.name())?;
                if args.is_empty() {
                    f.write_str("1")?;
                } else {
                    join(f, args, ", ")?;
                }
                f.write_str(")")
            }
            Expr::Cast { expr, ty } => {
                let target = match ty {
                    CastType::Text => "TEXT",
                };
                write!(f, "CAST({expr} AS {target})")
            }
            Expr::Like { expr, pattern } => {
                write!(f, "{} LIKE {} ESCAPE '\\'", Grouped(expr), Quoted(pattern))
            }
            Expr::Subquery(select) => write!(f, "({select})"),
        }
    }
}

/// SQL has no literal for NaN or the infinities; they render as `NULL`,
/// which is what comparing or aggregating them yields in most engines.
fn write_literal(f: &mut Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("NULL"),
        Value::Bool(true) => f.write_str("TRUE"),
        Value::Bool(false) => f.write_str("FALSE"),
        Value::Int(v) => write!(f, "{v}"),
        Value::Float(v) if v.is_finite() => write!(f, "{v:?}"),
        Value::Float(_) => f.write_str("NULL"),
        Value::String(s) => Quoted(s).fmt(f),
    }
}

fn join<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

/// Operand of an arithmetic or comparison operator.
struct Grouped<'a>(&'a Expr);

impl Display for Grouped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { .. } | Expr::And(_) | Expr::Or(_) | Expr::Like { .. } => {
                write!(f, "({})", self.0)
            }
            other => other.fmt(f),
        }
    }
}

/// Operand of AND/OR; only nested connectives need parentheses.
struct Term<'a>(&'a Expr);

impl Display for Term<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::And(_) | Expr::Or(_) => write!(f, "({})", self.0),
            other => other.fmt(f),
        }
    }
}

struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.replace('\'', "''"))
    }
}

struct Ident<'a>(&'a str);

impl Display for Ident<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = self.0;
        let mut chars = name.chars();
        let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED.contains(&name.to_ascii_lowercase().as_str());
        if simple {
            f.write_str(name)
        } else {
            write!(f, "\"{}\"", name.replace('"', "\"\""))
        }
    }
}
