//! Aggregate, scalar and window function helpers plus the CASE builder.

use crate::qb::expr::{Expr, ExprNode, IntoNode};
use crate::qb::predicate::Predicate;
use crate::types::{ColumnType, Nullable, SqlValue};
use std::sync::Arc;

fn function(name: &str, args: Vec<ExprNode>, distinct: bool) -> ExprNode {
    ExprNode::Function {
        name: name.to_string(),
        args,
        distinct,
    }
}

// Frame offsets and bucket counts are inlined like LIMIT values.
fn inline(n: u32) -> ExprNode {
    ExprNode::Raw {
        sql: n.to_string(),
        params: Vec::new(),
    }
}

/// Call an arbitrary function: `NAME(arg, ...)`.
pub fn call<T: SqlValue>(name: &str, args: Vec<ExprNode>) -> Expr<T> {
    Expr::from_parts(function(name, args, false), T::column_type())
}

// ==================== Aggregates ====================

/// `COUNT(*)`
pub fn count_star() -> Expr<i64> {
    call("COUNT", vec![ExprNode::Star])
}

/// `COUNT(expr)`
pub fn count(expr: impl IntoNode) -> Expr<i64> {
    call("COUNT", vec![expr.into_node()])
}

/// `COUNT(DISTINCT expr)`
pub fn count_distinct(expr: impl IntoNode) -> Expr<i64> {
    Expr::from_parts(
        function("COUNT", vec![expr.into_node()], true),
        i64::column_type(),
    )
}

fn same_type<T>(name: &str, expr: &Expr<T>) -> Expr<T> {
    Expr::from_parts(
        function(name, vec![expr.node().clone()], false),
        Arc::clone(expr.column_type()),
    )
}

/// `SUM(expr)`
pub fn sum<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("SUM", expr)
}

/// `AVG(expr)`
pub fn avg(expr: impl IntoNode) -> Expr<f64> {
    call("AVG", vec![expr.into_node()])
}

/// `MIN(expr)`
pub fn min<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("MIN", expr)
}

/// `MAX(expr)`
pub fn max<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("MAX", expr)
}

// ==================== Scalars ====================

/// `LOWER(expr)`
pub fn lower<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("LOWER", expr)
}

/// `UPPER(expr)`
pub fn upper<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("UPPER", expr)
}

/// `COALESCE(a, b, ...)`, typed by the last (fallback) argument.
pub fn coalesce<T>(nullable: &[ExprNode], fallback: &Expr<T>) -> Expr<T> {
    let mut args = nullable.to_vec();
    args.push(fallback.node().clone());
    Expr::from_parts(ExprNode::Coalesce(args), Arc::clone(fallback.column_type()))
}

// ==================== Window functions ====================

/// `ROW_NUMBER()`
pub fn row_number() -> Expr<i64> {
    call("ROW_NUMBER", Vec::new())
}

/// `RANK()`
pub fn rank() -> Expr<i64> {
    call("RANK", Vec::new())
}

/// `DENSE_RANK()`
pub fn dense_rank() -> Expr<i64> {
    call("DENSE_RANK", Vec::new())
}

/// `NTILE(buckets)`
pub fn ntile(buckets: u32) -> Expr<i64> {
    call("NTILE", vec![inline(buckets)])
}

fn offset_fn<T: 'static>(name: &str, expr: &Expr<T>, offset: u32) -> Expr<Option<T>> {
    Expr::new(
        function(name, vec![expr.node().clone(), inline(offset)], false),
        Nullable(Arc::clone(expr.column_type())),
    )
}

/// `LAG(expr, offset)`; NULL before the first row.
pub fn lag<T: 'static>(expr: &Expr<T>, offset: u32) -> Expr<Option<T>> {
    offset_fn("LAG", expr, offset)
}

/// `LEAD(expr, offset)`; NULL after the last row.
pub fn lead<T: 'static>(expr: &Expr<T>, offset: u32) -> Expr<Option<T>> {
    offset_fn("LEAD", expr, offset)
}

/// `FIRST_VALUE(expr)`
pub fn first_value<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("FIRST_VALUE", expr)
}

/// `LAST_VALUE(expr)`
pub fn last_value<T>(expr: &Expr<T>) -> Expr<T> {
    same_type("LAST_VALUE", expr)
}

// ==================== CASE ====================

/// Start a searched CASE expression.
///
/// ```ignore
/// let bracket = case_when(age.lt(13), &lit("child".to_string()))
///     .when(age.lt(20), &lit("teen".to_string()))
///     .otherwise(&lit("adult".to_string()));
/// ```
pub fn case_when<T>(condition: Predicate, then: &Expr<T>) -> CaseBuilder<T> {
    CaseBuilder {
        branches: vec![(condition, then.node().clone())],
        ty: Arc::clone(then.column_type()),
    }
}

/// Accumulates WHEN branches of a CASE expression.
pub struct CaseBuilder<T> {
    branches: Vec<(Predicate, ExprNode)>,
    ty: Arc<dyn ColumnType<T>>,
}

impl<T> CaseBuilder<T> {
    /// Add a `WHEN condition THEN value` branch.
    pub fn when(mut self, condition: Predicate, then: &Expr<T>) -> Self {
        self.branches.push((condition, then.node().clone()));
        self
    }

    /// Finish with an ELSE branch.
    pub fn otherwise(self, value: &Expr<T>) -> Expr<T> {
        Expr::from_parts(
            ExprNode::Case {
                branches: self.branches,
                otherwise: Some(Box::new(value.node().clone())),
            },
            self.ty,
        )
    }
}

impl<T: 'static> CaseBuilder<T> {
    /// Finish without ELSE; unmatched rows yield NULL.
    pub fn end(self) -> Expr<Option<T>> {
        Expr::new(
            ExprNode::Case {
                branches: self.branches,
                otherwise: None,
            },
            Nullable(self.ty),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, GenericDialect, PostgresDialect};
    use crate::qb::expr::lit;
    use crate::qb::param::ParamList;
    use crate::qb::window::WindowSpec;
    use crate::table::Table;
    use crate::value::Value;

    fn render<T>(expr: &Expr<T>, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let mut params = ParamList::new();
        let sql = expr.render(dialect, &mut params);
        (sql, params.into_values())
    }

    #[test]
    fn test_aggregates() {
        let orders = Table::new("orders");
        let user_id = orders.typed::<i64>("user_id");
        let amount = orders.typed::<f64>("amount");
        assert_eq!(render(&count_star(), &GenericDialect).0, "COUNT(*)");
        assert_eq!(
            render(&count_distinct(&user_id), &GenericDialect).0,
            "COUNT(DISTINCT \"orders\".\"user_id\")"
        );
        assert_eq!(
            render(&sum(&amount).alias("total"), &GenericDialect).0,
            "SUM(\"orders\".\"amount\") AS \"total\""
        );
        assert_eq!(render(&avg(&amount), &GenericDialect).0, "AVG(\"orders\".\"amount\")");
    }

    #[test]
    fn test_lag_inlines_offset() {
        let prices = Table::new("prices");
        let close = prices.typed::<f64>("close");
        let day = prices.typed::<i64>("day");
        let (sql, params) = render(
            &lag(&close, 1).over(WindowSpec::new().order_by(day.asc())),
            &PostgresDialect,
        );
        assert_eq!(
            sql,
            "LAG(\"prices\".\"close\", 1) OVER (ORDER BY \"prices\".\"day\" ASC)"
        );
        assert!(params.is_empty());
        assert_eq!(render(&ntile(4), &GenericDialect).0, "NTILE(4)");
    }

    #[test]
    fn test_case_params_in_branch_order() {
        let users = Table::new("users");
        let age = users.typed::<i32>("age");
        let bracket = case_when(age.lt(13), &lit("child".to_string()))
            .when(age.lt(20), &lit("teen".to_string()))
            .otherwise(&lit("adult".to_string()));
        let (sql, params) = render(&bracket, &PostgresDialect);
        assert_eq!(
            sql,
            "CASE WHEN \"users\".\"age\" < $1 THEN $2 WHEN \"users\".\"age\" < $3 THEN $4 ELSE $5 END"
        );
        assert_eq!(
            params,
            vec![
                Value::Int(13),
                Value::Text("child".into()),
                Value::Int(20),
                Value::Text("teen".into()),
                Value::Text("adult".into()),
            ]
        );
    }

    #[test]
    fn test_case_without_else() {
        let users = Table::new("users");
        let banned = users.typed::<bool>("banned");
        let (sql, _) = render(
            &case_when(banned.eq(true), &lit(0i32)).end(),
            &GenericDialect,
        );
        assert_eq!(sql, "CASE WHEN \"users\".\"banned\" = ? THEN ? END");
    }

    #[test]
    fn test_coalesce() {
        let users = Table::new("users");
        let nick = users.typed::<Option<String>>("nick");
        let name = users.typed::<String>("name");
        let (sql, _) = render(&coalesce(&[nick.node().clone()], &name), &GenericDialect);
        assert_eq!(sql, "COALESCE(\"users\".\"nick\", \"users\".\"name\")");
    }
}
