//! Boolean predicates for WHERE/HAVING/ON/CASE.
//!
//! Rendering policies:
//! - empty IN → `1 = 0`, empty NOT IN → `1 = 1`, no parameters
//! - empty AND → `1 = 1`, empty OR → `1 = 0`
//! - single-operand AND/OR renders its operand directly
//! - operands of a multi-operand AND/OR render bare, except nested groups
//!   and raw fragments which are parenthesized
//! - ILIKE without native support → `LOWER(x) LIKE LOWER(?)`

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::qb::expr::{Expr, ExprNode};
use crate::qb::param::{ParamList, bind_template};
use crate::qb::select::SelectBuilder;
use crate::qb::traits::Statement;
use crate::types::SqlValue;
use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Subquery quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
    Some,
}

impl Quantifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantifier::Any => "ANY",
            Quantifier::All => "ALL",
            Quantifier::Some => "SOME",
        }
    }
}

/// Predicate node.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `left op right`
    Compare {
        left: ExprNode,
        op: CompareOp,
        right: ExprNode,
    },

    /// `expr IS [NOT] NULL`
    NullCheck { expr: ExprNode, negated: bool },

    /// `expr [NOT] IN (v, ...)`
    InList {
        expr: ExprNode,
        values: Vec<ExprNode>,
        negated: bool,
    },

    /// `expr [NOT] IN (SELECT ...)`
    InSubquery {
        expr: ExprNode,
        query: Box<SelectBuilder>,
        negated: bool,
    },

    /// `expr [NOT] BETWEEN from AND to`
    Between {
        expr: ExprNode,
        from: ExprNode,
        to: ExprNode,
        negated: bool,
    },

    /// `expr [NOT] LIKE|ILIKE pattern`
    Like {
        expr: ExprNode,
        pattern: ExprNode,
        negated: bool,
        case_insensitive: bool,
    },

    /// AND group: all operands must be true.
    And(Vec<Predicate>),

    /// OR group: at least one operand must be true.
    Or(Vec<Predicate>),

    /// `NOT (p)`
    Not(Box<Predicate>),

    /// `[NOT] EXISTS (SELECT ...)`
    Exists {
        query: Box<SelectBuilder>,
        negated: bool,
    },

    /// `left op ANY|ALL|SOME (SELECT ...)`
    Quantified {
        left: ExprNode,
        op: CompareOp,
        quantifier: Quantifier,
        query: Box<SelectBuilder>,
    },

    /// Caller-supplied boolean SQL with `?` markers bound to `params`.
    Raw { sql: String, params: Vec<Value> },

    /// Always true (`1 = 1`).
    True,

    /// Always false (`1 = 0`).
    False,
}

impl Predicate {
    /// Caller-supplied boolean SQL. The text is emitted verbatim; `?` markers
    /// are bound to `params` in order.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Predicate::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// `self AND other`. Appends to `self` when it already is an AND group.
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut operands) => {
                operands.push(other);
                Predicate::And(operands)
            }
            p => Predicate::And(vec![p, other]),
        }
    }

    /// `self OR other`. Appends to `self` when it already is an OR group.
    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut operands) => {
                operands.push(other);
                Predicate::Or(operands)
            }
            p => Predicate::Or(vec![p, other]),
        }
    }

    /// Use this predicate as a boolean value expression.
    pub fn into_expr(self) -> Expr<bool> {
        Expr::from_parts(ExprNode::Predicate(Box::new(self)), bool::column_type())
    }

    /// Validate every subquery nested in this predicate.
    pub(crate) fn validate_nested(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        match self {
            Predicate::Compare { left, right, .. } => {
                left.validate_nested(dialect)?;
                right.validate_nested(dialect)
            }
            Predicate::NullCheck { expr, .. } => expr.validate_nested(dialect),
            Predicate::InList { expr, values, .. } => {
                expr.validate_nested(dialect)?;
                values.iter().try_for_each(|v| v.validate_nested(dialect))
            }
            Predicate::InSubquery { expr, query, .. } => {
                expr.validate_nested(dialect)?;
                query.validate(dialect)
            }
            Predicate::Between { expr, from, to, .. } => {
                expr.validate_nested(dialect)?;
                from.validate_nested(dialect)?;
                to.validate_nested(dialect)
            }
            Predicate::Like { expr, pattern, .. } => {
                expr.validate_nested(dialect)?;
                pattern.validate_nested(dialect)
            }
            Predicate::And(operands) | Predicate::Or(operands) => {
                operands.iter().try_for_each(|p| p.validate_nested(dialect))
            }
            Predicate::Not(inner) => inner.validate_nested(dialect),
            Predicate::Exists { query, .. } => query.validate(dialect),
            Predicate::Quantified { left, query, .. } => {
                left.validate_nested(dialect)?;
                query.validate(dialect)
            }
            Predicate::Raw { .. } | Predicate::True | Predicate::False => Ok(()),
        }
    }

    /// Render this predicate, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        match self {
            Predicate::Compare { left, op, right } => {
                let left = left.render(dialect, params);
                let right = right.render(dialect, params);
                format!("{left} {} {right}", op.as_str())
            }
            Predicate::NullCheck { expr, negated } => {
                let expr = expr.render(dialect, params);
                if *negated {
                    format!("{expr} IS NOT NULL")
                } else {
                    format!("{expr} IS NULL")
                }
            }
            Predicate::InList {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated { "1 = 1" } else { "1 = 0" }.to_string();
                }
                let expr = expr.render(dialect, params);
                let values: Vec<String> = values.iter().map(|v| v.render(dialect, params)).collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{expr} {op} ({})", values.join(", "))
            }
            Predicate::InSubquery {
                expr,
                query,
                negated,
            } => {
                let expr = expr.render(dialect, params);
                let query = query.render(dialect, params);
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{expr} {op} ({query})")
            }
            Predicate::Between {
                expr,
                from,
                to,
                negated,
            } => {
                let expr = expr.render(dialect, params);
                let from = from.render(dialect, params);
                let to = to.render(dialect, params);
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{expr} {op} {from} AND {to}")
            }
            Predicate::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                let expr = expr.render(dialect, params);
                let pattern = pattern.render(dialect, params);
                let not = if *negated { "NOT " } else { "" };
                if *case_insensitive && !dialect.supports_ilike() {
                    format!("LOWER({expr}) {not}LIKE LOWER({pattern})")
                } else {
                    let op = if *case_insensitive { "ILIKE" } else { "LIKE" };
                    format!("{expr} {not}{op} {pattern}")
                }
            }
            Predicate::And(operands) => render_group(operands, " AND ", "1 = 1", dialect, params),
            Predicate::Or(operands) => render_group(operands, " OR ", "1 = 0", dialect, params),
            Predicate::Not(inner) => format!("NOT ({})", inner.render(dialect, params)),
            Predicate::Exists { query, negated } => {
                let query = query.render(dialect, params);
                if *negated {
                    format!("NOT EXISTS ({query})")
                } else {
                    format!("EXISTS ({query})")
                }
            }
            Predicate::Quantified {
                left,
                op,
                quantifier,
                query,
            } => {
                let left = left.render(dialect, params);
                let query = query.render(dialect, params);
                format!("{left} {} {} ({query})", op.as_str(), quantifier.as_str())
            }
            Predicate::Raw { sql, params: values } => bind_template(sql, values, dialect, params),
            Predicate::True => "1 = 1".to_string(),
            Predicate::False => "1 = 0".to_string(),
        }
    }

    /// Whether this predicate needs parentheses as an AND/OR operand.
    fn needs_grouping(&self) -> bool {
        match self {
            Predicate::And(operands) | Predicate::Or(operands) => match operands.as_slice() {
                [only] => only.needs_grouping(),
                ops => ops.len() > 1,
            },
            Predicate::Raw { .. } => true,
            _ => false,
        }
    }
}

fn render_group(
    operands: &[Predicate],
    separator: &str,
    empty: &str,
    dialect: &dyn Dialect,
    params: &mut ParamList,
) -> String {
    match operands {
        [] => empty.to_string(),
        [only] => only.render(dialect, params),
        _ => operands
            .iter()
            .map(|p| {
                let sql = p.render(dialect, params);
                if p.needs_grouping() {
                    format!("({sql})")
                } else {
                    sql
                }
            })
            .collect::<Vec<_>>()
            .join(separator),
    }
}

/// Negate a predicate. `not(not(p))` returns `p` unchanged.
pub fn not(predicate: Predicate) -> Predicate {
    match predicate {
        Predicate::Not(inner) => *inner,
        p => Predicate::Not(Box::new(p)),
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        not(self)
    }
}

/// AND of all predicates (`1 = 1` when empty).
pub fn and_all(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::And(predicates.into_iter().collect())
}

/// OR of all predicates (`1 = 0` when empty).
pub fn or_any(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Or(predicates.into_iter().collect())
}

/// `EXISTS (SELECT ...)`
pub fn exists(query: SelectBuilder) -> Predicate {
    Predicate::Exists {
        query: Box::new(query),
        negated: false,
    }
}

/// `NOT EXISTS (SELECT ...)`
pub fn not_exists(query: SelectBuilder) -> Predicate {
    Predicate::Exists {
        query: Box::new(query),
        negated: true,
    }
}
