//! Scalar expressions appearing in projections, predicates and orderings.

use crate::request::Value;

use super::select::Select;

/// Reference to a column of a relation in the FROM list.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnRef {
    /// Alias of the relation.
    pub relation: String,
    /// Column name within the relation.
    pub name: String,
}

/// Binary operators over scalars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOperator {
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

impl BinaryOperator {
    /// SQL spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

/// Scalar and aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Func {
    Count,
    Sum,
    Max,
    Min,
    Upper,
    Lower,
}

impl Func {
    /// SQL function name.
    pub fn name(self) -> &'static str {
        match self {
            Func::Count => "count",
            Func::Sum => "sum",
            Func::Max => "max",
            Func::Min => "min",
            Func::Upper => "upper",
            Func::Lower => "lower",
        }
    }
}

/// Target of a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastType {
    /// Character data.
    Text,
}

/// Scalar expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column of a relation.
    Column(ColumnRef),
    /// Constant.
    Literal(Value),
    /// `lhs op rhs`.
    Binary {
        /// Operator.
        op: BinaryOperator,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Conjunction of all operands.
    And(Vec<Expr>),
    /// Disjunction of all operands.
    Or(Vec<Expr>),
    /// Function call; `count` with no arguments counts rows.
    Func {
        /// Function.
        func: Func,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Type conversion.
    Cast {
        /// Converted expression.
        expr: Box<Expr>,
        /// Target type.
        ty: CastType,
    },
    /// Pattern match with `\` as the escape character.
    Like {
        /// Matched text.
        expr: Box<Expr>,
        /// LIKE pattern.
        pattern: String,
    },
    /// Single-column sub-select evaluated per enclosing row.
    Subquery(Box<Select>),
}

impl Expr {
    /// Column `relation.name`.
    pub fn column(relation: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef {
            relation: relation.into(),
            name: name.into(),
        })
    }

    /// Row count.
    pub fn count() -> Self {
        Expr::Func {
            func: Func::Count,
            args: Vec::new(),
        }
    }

    /// Single-argument function call.
    pub fn call(func: Func, arg: Expr) -> Self {
        Expr::Func {
            func,
            args: vec![arg],
        }
    }

    /// Binary expression.
    pub fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Conjunction, flattening nested conjunctions.
    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        let mut terms = Vec::new();
        for side in [lhs, rhs] {
            match side {
                Expr::And(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        Expr::And(terms)
    }

    /// Disjunction, flattening nested disjunctions.
    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        let mut terms = Vec::new();
        for side in [lhs, rhs] {
            match side {
                Expr::Or(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        Expr::Or(terms)
    }

    /// Name a database would give this expression as an output column.
    pub fn natural_name(&self) -> &str {
        match self {
            Expr::Column(col) => &col.name,
            Expr::Func { func, .. } => func.name(),
            Expr::Cast { expr, .. } => expr.natural_name(),
            Expr::Literal(_) => "literal",
            Expr::Subquery(select) => select.first_column().map_or("expr", |col| col.key()),
            _ => "expr",
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}
