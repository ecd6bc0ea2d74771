//! Typed value expressions.
//!
//! [`ExprNode`] is the untyped tree that gets rendered; [`Expr<T>`] pairs a
//! node with the [`ColumnType<T>`] that serializes literals compared against
//! it. Comparison methods on `Expr<T>` produce [`Predicate`]s, arithmetic and
//! window methods produce new `Expr<T>`s.
//!
//! `ExprNode::render` appends a value to the [`ParamList`] at the exact
//! moment it writes the matching placeholder, and composite nodes render
//! their children left to right, so placeholder order and parameter order
//! cannot diverge.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::qb::param::{ParamList, bind_template};
use crate::qb::predicate::{CompareOp, Predicate, Quantifier};
use crate::qb::select::SelectBuilder;
use crate::qb::traits::Statement;
use crate::qb::window::{OrderItem, WindowSpec};
use crate::table::ColumnRef;
use crate::types::{ColumnType, SqlValue, TimestampTz};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// String concatenation (`||`).
    Concat,
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Concat => "||",
        }
    }
}

/// Untyped expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// `"table"."column"`
    Column(ColumnRef),

    /// Bound value, rendered as a placeholder.
    Literal(Value),

    /// Caller-supplied SQL. `?` markers are bound to `params` in order.
    Raw { sql: String, params: Vec<Value> },

    /// `*`, only meaningful as a function argument (`COUNT(*)`).
    Star,

    /// `NAME([DISTINCT] arg, ...)`
    Function {
        name: String,
        args: Vec<ExprNode>,
        distinct: bool,
    },

    /// `left op right`; nested binary operands are parenthesized.
    Binary {
        left: Box<ExprNode>,
        op: ArithOp,
        right: Box<ExprNode>,
    },

    /// `expr AS "alias"`
    Alias { expr: Box<ExprNode>, alias: String },

    /// `CASE WHEN p THEN v ... [ELSE v] END`
    Case {
        branches: Vec<(Predicate, ExprNode)>,
        otherwise: Option<Box<ExprNode>>,
    },

    /// `COALESCE(a, b, ...)`
    Coalesce(Vec<ExprNode>),

    /// Scalar subquery.
    Subquery(Box<SelectBuilder>),

    /// `func OVER (spec)`
    Window { func: Box<ExprNode>, spec: WindowSpec },

    /// Dialect current-timestamp expression.
    CurrentTimestamp,

    /// Boolean predicate used as a value.
    Predicate(Box<Predicate>),
}

impl ExprNode {
    /// Render this node, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        match self {
            ExprNode::Column(column) => column.render(dialect),
            ExprNode::Literal(value) => params.bind(dialect, value.clone()),
            ExprNode::Raw { sql, params: values } => bind_template(sql, values, dialect, params),
            ExprNode::Star => "*".to_string(),
            ExprNode::Function {
                name,
                args,
                distinct,
            } => {
                let args: Vec<String> = args.iter().map(|a| a.render(dialect, params)).collect();
                let distinct = if *distinct { "DISTINCT " } else { "" };
                format!("{name}({distinct}{})", args.join(", "))
            }
            ExprNode::Binary { left, op, right } => {
                let left = left.render_operand(dialect, params);
                let right = right.render_operand(dialect, params);
                format!("{left} {} {right}", op.as_str())
            }
            ExprNode::Alias { expr, alias } => {
                let expr = expr.render(dialect, params);
                format!("{expr} AS {}", dialect.quote_identifier(alias))
            }
            ExprNode::Case {
                branches,
                otherwise,
            } => {
                let mut sql = String::from("CASE");
                for (cond, value) in branches {
                    let cond = cond.render(dialect, params);
                    let value = value.render(dialect, params);
                    sql.push_str(&format!(" WHEN {cond} THEN {value}"));
                }
                if let Some(value) = otherwise {
                    sql.push_str(" ELSE ");
                    sql.push_str(&value.render(dialect, params));
                }
                sql.push_str(" END");
                sql
            }
            ExprNode::Coalesce(args) => {
                let args: Vec<String> = args.iter().map(|a| a.render(dialect, params)).collect();
                format!("COALESCE({})", args.join(", "))
            }
            ExprNode::Subquery(query) => format!("({})", query.render(dialect, params)),
            ExprNode::Window { func, spec } => {
                let func = func.render(dialect, params);
                format!("{func} OVER ({})", spec.render(dialect, params))
            }
            ExprNode::CurrentTimestamp => dialect.current_timestamp().to_string(),
            ExprNode::Predicate(pred) => format!("({})", pred.render(dialect, params)),
        }
    }

    /// Validate every subquery nested in this node.
    pub(crate) fn validate_nested(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        match self {
            ExprNode::Column(_)
            | ExprNode::Literal(_)
            | ExprNode::Raw { .. }
            | ExprNode::Star
            | ExprNode::CurrentTimestamp => Ok(()),
            ExprNode::Function { args, .. } | ExprNode::Coalesce(args) => {
                args.iter().try_for_each(|a| a.validate_nested(dialect))
            }
            ExprNode::Binary { left, right, .. } => {
                left.validate_nested(dialect)?;
                right.validate_nested(dialect)
            }
            ExprNode::Alias { expr, .. } => expr.validate_nested(dialect),
            ExprNode::Case {
                branches,
                otherwise,
            } => {
                for (cond, value) in branches {
                    cond.validate_nested(dialect)?;
                    value.validate_nested(dialect)?;
                }
                match otherwise {
                    Some(value) => value.validate_nested(dialect),
                    None => Ok(()),
                }
            }
            ExprNode::Subquery(query) => query.validate(dialect),
            ExprNode::Window { func, spec } => {
                func.validate_nested(dialect)?;
                spec.validate_nested(dialect)
            }
            ExprNode::Predicate(pred) => pred.validate_nested(dialect),
        }
    }

    fn render_operand(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        match self {
            ExprNode::Binary { .. } => format!("({})", self.render(dialect, params)),
            _ => self.render(dialect, params),
        }
    }
}

/// Conversion into an untyped node, used where operands of different host
/// types mix (projections, GROUP BY, PARTITION BY, function arguments).
pub trait IntoNode {
    fn into_node(self) -> ExprNode;
}

impl IntoNode for ExprNode {
    fn into_node(self) -> ExprNode {
        self
    }
}

impl<T> IntoNode for Expr<T> {
    fn into_node(self) -> ExprNode {
        self.node
    }
}

impl<T> IntoNode for &Expr<T> {
    fn into_node(self) -> ExprNode {
        self.node.clone()
    }
}

impl IntoNode for Predicate {
    fn into_node(self) -> ExprNode {
        ExprNode::Predicate(Box::new(self))
    }
}

/// An expression producing a value of host type `T`.
pub struct Expr<T> {
    node: ExprNode,
    ty: Arc<dyn ColumnType<T>>,
}

impl<T: 'static> Expr<T> {
    pub fn new(node: ExprNode, ty: impl ColumnType<T> + 'static) -> Self {
        Self::from_parts(node, Arc::new(ty))
    }
}

impl<T> Expr<T> {
    pub fn from_parts(node: ExprNode, ty: Arc<dyn ColumnType<T>>) -> Self {
        Self { node, ty }
    }

    pub fn node(&self) -> &ExprNode {
        &self.node
    }

    pub fn column_type(&self) -> &Arc<dyn ColumnType<T>> {
        &self.ty
    }

    /// Render this expression, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        self.node.render(dialect, params)
    }

    /// Literal node serialized through this expression's column type.
    pub fn value_node(&self, value: &T) -> ExprNode {
        ExprNode::Literal(self.ty.to_store(value))
    }

    fn with_node(&self, node: ExprNode) -> Expr<T> {
        Expr {
            node,
            ty: Arc::clone(&self.ty),
        }
    }

    // ==================== Comparison ====================

    /// Compare against an arbitrary node.
    pub fn compare_node(&self, op: CompareOp, right: impl IntoNode) -> Predicate {
        Predicate::Compare {
            left: self.node.clone(),
            op,
            right: right.into_node(),
        }
    }

    fn compare_value(&self, op: CompareOp, value: &T) -> Predicate {
        self.compare_node(op, self.value_node(value))
    }

    /// `self = ?`
    pub fn eq(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Eq, &value)
    }

    /// `self <> ?`
    pub fn ne(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Ne, &value)
    }

    /// `self > ?`
    pub fn gt(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Gt, &value)
    }

    /// `self >= ?`
    pub fn ge(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Ge, &value)
    }

    /// `self < ?`
    pub fn lt(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Lt, &value)
    }

    /// `self <= ?`
    pub fn le(&self, value: T) -> Predicate {
        self.compare_value(CompareOp::Le, &value)
    }

    /// `self = other`
    pub fn eq_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Eq, other)
    }

    /// `self <> other`
    pub fn ne_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Ne, other)
    }

    /// `self > other`
    pub fn gt_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Gt, other)
    }

    /// `self >= other`
    pub fn ge_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Ge, other)
    }

    /// `self < other`
    pub fn lt_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Lt, other)
    }

    /// `self <= other`
    pub fn le_expr(&self, other: &Expr<T>) -> Predicate {
        self.compare_node(CompareOp::Le, other)
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::NullCheck {
            expr: self.node.clone(),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::NullCheck {
            expr: self.node.clone(),
            negated: true,
        }
    }

    fn in_values(&self, values: impl IntoIterator<Item = T>, negated: bool) -> Predicate {
        Predicate::InList {
            expr: self.node.clone(),
            values: values.into_iter().map(|v| self.value_node(&v)).collect(),
            negated,
        }
    }

    /// `self IN (?, ...)`; an empty list renders `1 = 0`.
    pub fn in_list(&self, values: impl IntoIterator<Item = T>) -> Predicate {
        self.in_values(values, false)
    }

    /// `self NOT IN (?, ...)`; an empty list renders `1 = 1`.
    pub fn not_in(&self, values: impl IntoIterator<Item = T>) -> Predicate {
        self.in_values(values, true)
    }

    /// `self IN (SELECT ...)`
    pub fn in_subquery(&self, query: SelectBuilder) -> Predicate {
        Predicate::InSubquery {
            expr: self.node.clone(),
            query: Box::new(query),
            negated: false,
        }
    }

    /// `self NOT IN (SELECT ...)`
    pub fn not_in_subquery(&self, query: SelectBuilder) -> Predicate {
        Predicate::InSubquery {
            expr: self.node.clone(),
            query: Box::new(query),
            negated: true,
        }
    }

    /// `self BETWEEN ? AND ?`
    pub fn between(&self, from: T, to: T) -> Predicate {
        Predicate::Between {
            expr: self.node.clone(),
            from: self.value_node(&from),
            to: self.value_node(&to),
            negated: false,
        }
    }

    /// `self NOT BETWEEN ? AND ?`
    pub fn not_between(&self, from: T, to: T) -> Predicate {
        Predicate::Between {
            expr: self.node.clone(),
            from: self.value_node(&from),
            to: self.value_node(&to),
            negated: true,
        }
    }

    fn like_pattern(&self, pattern: String, negated: bool, case_insensitive: bool) -> Predicate {
        Predicate::Like {
            expr: self.node.clone(),
            pattern: ExprNode::Literal(Value::Text(pattern)),
            negated,
            case_insensitive,
        }
    }

    /// `self LIKE ?`
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        self.like_pattern(pattern.into(), false, false)
    }

    /// `self NOT LIKE ?`
    pub fn not_like(&self, pattern: impl Into<String>) -> Predicate {
        self.like_pattern(pattern.into(), true, false)
    }

    /// `self ILIKE ?`, or `LOWER(self) LIKE LOWER(?)` without native support.
    pub fn ilike(&self, pattern: impl Into<String>) -> Predicate {
        self.like_pattern(pattern.into(), false, true)
    }

    /// `self NOT ILIKE ?`
    pub fn not_ilike(&self, pattern: impl Into<String>) -> Predicate {
        self.like_pattern(pattern.into(), true, true)
    }

    /// `self op ANY|ALL|SOME (SELECT ...)`
    pub fn quantified(&self, op: CompareOp, quantifier: Quantifier, query: SelectBuilder) -> Predicate {
        Predicate::Quantified {
            left: self.node.clone(),
            op,
            quantifier,
            query: Box::new(query),
        }
    }

    /// `self op ANY (SELECT ...)`
    pub fn any(&self, op: CompareOp, query: SelectBuilder) -> Predicate {
        self.quantified(op, Quantifier::Any, query)
    }

    /// `self op ALL (SELECT ...)`
    pub fn all(&self, op: CompareOp, query: SelectBuilder) -> Predicate {
        self.quantified(op, Quantifier::All, query)
    }

    /// `self op SOME (SELECT ...)`
    pub fn some(&self, op: CompareOp, query: SelectBuilder) -> Predicate {
        self.quantified(op, Quantifier::Some, query)
    }

    // ==================== Arithmetic ====================

    fn binary(&self, op: ArithOp, right: ExprNode) -> Expr<T> {
        self.with_node(ExprNode::Binary {
            left: Box::new(self.node.clone()),
            op,
            right: Box::new(right),
        })
    }

    /// `self + ?`
    pub fn add(&self, value: T) -> Expr<T> {
        self.binary(ArithOp::Add, self.value_node(&value))
    }

    /// `self - ?`
    pub fn sub(&self, value: T) -> Expr<T> {
        self.binary(ArithOp::Sub, self.value_node(&value))
    }

    /// `self * ?`
    pub fn mul(&self, value: T) -> Expr<T> {
        self.binary(ArithOp::Mul, self.value_node(&value))
    }

    /// `self / ?`
    pub fn div(&self, value: T) -> Expr<T> {
        self.binary(ArithOp::Div, self.value_node(&value))
    }

    /// `self % ?`
    pub fn rem(&self, value: T) -> Expr<T> {
        self.binary(ArithOp::Mod, self.value_node(&value))
    }

    /// `self <op> other`
    pub fn arith(&self, op: ArithOp, other: &Expr<T>) -> Expr<T> {
        self.binary(op, other.node.clone())
    }

    /// `self || other`
    pub fn concat(&self, other: &Expr<T>) -> Expr<T> {
        self.binary(ArithOp::Concat, other.node.clone())
    }

    // ==================== Wrappers ====================

    /// `self AS "alias"`
    pub fn alias(&self, alias: impl Into<String>) -> Expr<T> {
        self.with_node(ExprNode::Alias {
            expr: Box::new(self.node.clone()),
            alias: alias.into(),
        })
    }

    /// Attach a window specification: `self OVER (spec)`.
    pub fn over(&self, spec: WindowSpec) -> Expr<T> {
        self.with_node(ExprNode::Window {
            func: Box::new(self.node.clone()),
            spec,
        })
    }

    /// Ascending sort item.
    pub fn asc(&self) -> OrderItem {
        OrderItem::asc(self)
    }

    /// Descending sort item.
    pub fn desc(&self) -> OrderItem {
        OrderItem::desc(self)
    }
}

impl<T: 'static> Expr<Option<T>> {
    /// `COALESCE(self, fallback)`, typed by the non-null fallback.
    pub fn or_else(&self, fallback: &Expr<T>) -> Expr<T> {
        Expr::from_parts(
            ExprNode::Coalesce(vec![self.node.clone(), fallback.node.clone()]),
            Arc::clone(&fallback.ty),
        )
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            ty: Arc::clone(&self.ty),
        }
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("node", &self.node)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Structural equality of the underlying nodes.
impl<T> PartialEq for Expr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

/// A bound literal using the default column type for `T`.
pub fn lit<T: SqlValue>(value: T) -> Expr<T> {
    let ty = T::column_type();
    Expr::from_parts(ExprNode::Literal(ty.to_store(&value)), ty)
}

/// Caller-supplied SQL with `?` markers bound to `params`.
///
/// The text is emitted verbatim; only its markers are rewritten.
pub fn raw<T: SqlValue>(sql: impl Into<String>, params: Vec<Value>) -> Expr<T> {
    Expr::from_parts(
        ExprNode::Raw {
            sql: sql.into(),
            params,
        },
        T::column_type(),
    )
}

/// The dialect's current-timestamp expression.
pub fn current_timestamp() -> Expr<DateTime<Utc>> {
    Expr::new(ExprNode::CurrentTimestamp, TimestampTz)
}

/// A scalar subquery `(SELECT ...)`.
pub fn scalar<T: SqlValue>(query: SelectBuilder) -> Expr<T> {
    Expr::from_parts(ExprNode::Subquery(Box::new(query)), T::column_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MySqlDialect, PostgresDialect};
    use crate::table::Table;
    use crate::ddl::SqlType;
    use crate::types::{self, CustomType};

    fn render<T>(expr: &Expr<T>, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let mut params = ParamList::new();
        let sql = expr.render(dialect, &mut params);
        (sql, params.into_values())
    }

    #[test]
    fn test_literal_uses_column_type() {
        // Stored as a lowercase code, compared through the column's own type.
        let code = CustomType::new(
            SqlType::Varchar(8),
            |s: &String| Value::Text(s.to_lowercase()),
            |v| match v {
                Value::Text(s) => Ok(s),
                other => Err(crate::QueryError::decode("code", other.to_string())),
            },
        );
        let countries = Table::new("countries");
        let iso = countries.column("iso", code);
        let mut params = ParamList::new();
        let sql = iso.eq("DE".to_string()).render(&GenericDialect, &mut params);
        assert_eq!(sql, "\"countries\".\"iso\" = ?");
        assert_eq!(params.values(), &[Value::Text("de".into())]);
    }

    #[test]
    fn test_nested_binary_parenthesized() {
        let items = Table::new("items");
        let price = items.column("price", types::Double);
        let qty = items.typed::<f64>("qty");
        let total = price.add(1.5).arith(ArithOp::Mul, &qty);
        let (sql, params) = render(&total, &PostgresDialect);
        assert_eq!(sql, "(\"items\".\"price\" + $1) * \"items\".\"qty\"");
        assert_eq!(params, vec![Value::Double(1.5)]);
    }

    #[test]
    fn test_alias_and_function() {
        let users = Table::new("users");
        let name = users.typed::<String>("name");
        let expr = Expr::from_parts(
            ExprNode::Function {
                name: "LOWER".into(),
                args: vec![name.node().clone()],
                distinct: false,
            },
            Arc::clone(name.column_type()),
        )
        .alias("lname");
        let (sql, _) = render(&expr, &MySqlDialect);
        assert_eq!(sql, "LOWER(`users`.`name`) AS `lname`");
    }

    #[test]
    fn test_raw_binds_markers() {
        let expr = raw::<i64>("EXTRACT(YEAR FROM ?) - ?", vec![Value::Int(1), Value::Int(2)]);
        let (sql, params) = render(&expr, &PostgresDialect);
        assert_eq!(sql, "EXTRACT(YEAR FROM $1) - $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_current_timestamp_from_dialect() {
        let (sql, params) = render(&current_timestamp(), &GenericDialect);
        assert_eq!(sql, "CURRENT_TIMESTAMP");
        assert!(params.is_empty());
    }

    #[test]
    fn test_or_else_coalesce() {
        let users = Table::new("users");
        let nick = users.column("nick", types::Text.nullable());
        let expr = nick.or_else(&lit("anon".to_string()));
        let (sql, params) = render(&expr, &GenericDialect);
        assert_eq!(sql, "COALESCE(\"users\".\"nick\", ?)");
        assert_eq!(params, vec![Value::Text("anon".into())]);
    }

    #[test]
    fn test_predicate_as_value() {
        let users = Table::new("users");
        let age = users.typed::<i32>("age");
        let adult = Expr::from_parts(age.ge(18).into_node(), bool::column_type()).alias("adult");
        let (sql, params) = render(&adult, &GenericDialect);
        assert_eq!(sql, "(\"users\".\"age\" >= ?) AS \"adult\"");
        assert_eq!(params, vec![Value::Int(18)]);
    }
}
