//! SELECT query builder.

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::qb::expr::{ExprNode, IntoNode};
use crate::qb::func::count_star;
use crate::qb::param::ParamList;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{Statement, StatementKind};
use crate::qb::window::{OrderItem, render_order_list};
use crate::table::Table;

/// Table or aliased subquery in FROM / JOIN position.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    Table(Table),
    Subquery {
        query: Box<SelectBuilder>,
        alias: String,
    },
}

impl FromSource {
    fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        match self {
            FromSource::Table(_) => Ok(()),
            FromSource::Subquery { query, .. } => Statement::validate(query.as_ref(), dialect),
        }
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        match self {
            FromSource::Table(table) => table.render_source(dialect),
            FromSource::Subquery { query, alias } => format!(
                "({}) AS {}",
                query.render(dialect, params),
                dialect.quote_identifier(alias)
            ),
        }
    }
}

impl From<&Table> for FromSource {
    fn from(table: &Table) -> Self {
        FromSource::Table(table.clone())
    }
}

/// JOIN type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// One JOIN clause. `on` is `None` only for CROSS JOIN.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: FromSource,
    pub on: Option<Predicate>,
}

impl JoinClause {
    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let target = self.target.render(dialect, params);
        match &self.on {
            Some(on) => format!("{} {target} ON {}", self.kind.as_str(), on.render(dialect, params)),
            None => format!("{} {target}", self.kind.as_str()),
        }
    }
}

/// SELECT query builder.
///
/// Clauses render in grammar order no matter the order they were configured
/// in, and a single [`ParamList`] threads through the whole statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectBuilder {
    distinct: bool,
    /// Empty means `*`.
    projection: Vec<ExprNode>,
    from: Option<FromSource>,
    joins: Vec<JoinClause>,
    where_clause: Option<Predicate>,
    group_by: Vec<ExprNode>,
    having: Option<Predicate>,
    order_by: Vec<OrderItem>,
    limit: Option<u64>,
    offset: Option<u64>,
    for_update: bool,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Source ====================

    /// Set the FROM table.
    pub fn from(mut self, table: &Table) -> Self {
        self.from = Some(FromSource::from(table));
        self
    }

    /// Select from an aliased subquery: `FROM (SELECT ...) AS "alias"`.
    pub fn from_subquery(mut self, query: SelectBuilder, alias: impl Into<String>) -> Self {
        self.from = Some(FromSource::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    // ==================== SELECT columns ====================

    /// Append one projection item.
    pub fn column(mut self, expr: impl IntoNode) -> Self {
        self.projection.push(expr.into_node());
        self
    }

    /// Append several projection items of the same kind.
    pub fn columns<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoNode,
    {
        self.projection
            .extend(exprs.into_iter().map(IntoNode::into_node));
        self
    }

    /// `SELECT DISTINCT`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== JOIN ====================

    /// Add a JOIN of any kind against a table.
    pub fn join(mut self, kind: JoinKind, table: &Table, on: Predicate) -> Self {
        self.joins.push(JoinClause {
            kind,
            target: FromSource::from(table),
            on: Some(on),
        });
        self
    }

    /// Add a JOIN against an aliased subquery.
    pub fn join_subquery(
        mut self,
        kind: JoinKind,
        query: SelectBuilder,
        alias: impl Into<String>,
        on: Predicate,
    ) -> Self {
        self.joins.push(JoinClause {
            kind,
            target: FromSource::Subquery {
                query: Box::new(query),
                alias: alias.into(),
            },
            on: Some(on),
        });
        self
    }

    /// Add INNER JOIN.
    pub fn inner_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    /// Add FULL OUTER JOIN.
    pub fn full_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Full, table, on)
    }

    /// Add CROSS JOIN.
    pub fn cross_join(mut self, table: &Table) -> Self {
        self.joins.push(JoinClause {
            kind: JoinKind::Cross,
            target: FromSource::from(table),
            on: None,
        });
        self
    }

    // ==================== WHERE ====================

    /// Replace the WHERE condition.
    pub fn where_clause(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    /// AND a condition onto WHERE.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// OR a condition onto WHERE.
    pub fn or_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.or(predicate),
            None => predicate,
        });
        self
    }

    // ==================== Grouping ====================

    /// Append a GROUP BY expression.
    pub fn group_by(mut self, expr: impl IntoNode) -> Self {
        self.group_by.push(expr.into_node());
        self
    }

    /// Replace the HAVING condition.
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having = Some(predicate);
        self
    }

    /// AND a condition onto HAVING.
    pub fn and_having(mut self, predicate: Predicate) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    // ==================== Ordering & Pagination ====================

    /// Append an ORDER BY item.
    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn page(mut self, page: u64, per_page: u64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1).saturating_mul(size));
        self
    }

    /// Append `FOR UPDATE`.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// A `SELECT COUNT(*)` over the rows this query would return, ignoring
    /// ORDER BY and pagination.
    ///
    /// Plain queries swap their projection for `COUNT(*)`; grouped or
    /// DISTINCT queries are wrapped as `FROM (...) AS "t"`.
    pub fn count(&self) -> SelectBuilder {
        let mut inner = self.clone();
        inner.order_by.clear();
        inner.limit = None;
        inner.offset = None;
        inner.for_update = false;

        if inner.distinct || !inner.group_by.is_empty() || inner.having.is_some() {
            SelectBuilder::new()
                .column(count_star())
                .from_subquery(inner, "t")
        } else {
            inner.projection = vec![count_star().into_node()];
            inner
        }
    }

    // ==================== Build ====================

    /// Render the statement, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.projection.is_empty() {
            sql.push('*');
        } else {
            let cols: Vec<String> = self
                .projection
                .iter()
                .map(|e| e.render(dialect, params))
                .collect();
            sql.push_str(&cols.join(", "));
        }

        if let Some(from) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(&from.render(dialect, params));
        }

        // JOINs
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render(dialect, params));
        }

        if let Some(predicate) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.render(dialect, params));
        }

        if !self.group_by.is_empty() {
            let exprs: Vec<String> = self
                .group_by
                .iter()
                .map(|e| e.render(dialect, params))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&exprs.join(", "));
        }

        if let Some(predicate) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&predicate.render(dialect, params));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&render_order_list(&self.order_by, dialect, params));
        }

        if let Some(clause) = dialect.limit_offset(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&clause);
        }

        if self.for_update {
            sql.push_str(" FOR UPDATE");
        }

        sql
    }
}

impl Statement for SelectBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }

    /// Checks this statement and every subquery nested in it.
    fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        if self.projection.is_empty() && self.from.is_none() {
            return Err(QueryError::invalid("SELECT * requires a FROM clause"));
        }
        if self.for_update && !dialect.supports_for_update() {
            return Err(QueryError::unsupported("FOR UPDATE", dialect.name()));
        }
        for expr in self.projection.iter().chain(&self.group_by) {
            expr.validate_nested(dialect)?;
        }
        if let Some(from) = &self.from {
            from.validate(dialect)?;
        }
        for join in &self.joins {
            join.target.validate(dialect)?;
            if let Some(on) = &join.on {
                on.validate_nested(dialect)?;
            }
        }
        for predicate in self.where_clause.iter().chain(&self.having) {
            predicate.validate_nested(dialect)?;
        }
        self.order_by
            .iter()
            .try_for_each(|item| item.validate_nested(dialect))
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        SelectBuilder::render(self, dialect, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect};
    use crate::qb::func::{count, sum};
    use crate::table::Table;
    use crate::value::Value;

    #[test]
    fn test_simple_select() {
        let users = Table::new("users");
        let qb = SelectBuilder::new().from(&users);
        assert_eq!(qb.to_sql(&GenericDialect), "SELECT * FROM \"users\"");
    }

    #[test]
    fn test_select_with_where() {
        let users = Table::new("users");
        let status = users.typed::<String>("status");
        let age = users.typed::<i32>("age");
        let prepared = SelectBuilder::new()
            .from(&users)
            .column(&status)
            .and_where(status.eq("active".to_string()))
            .and_where(age.gt(18))
            .build(&PostgresDialect)
            .unwrap();
        assert_eq!(
            prepared.sql,
            "SELECT \"users\".\"status\" FROM \"users\" \
             WHERE \"users\".\"status\" = $1 AND \"users\".\"age\" > $2"
        );
        assert_eq!(
            prepared.params,
            vec![Value::Text("active".into()), Value::Int(18)]
        );
    }

    #[test]
    fn test_or_where_groups_existing_and() {
        let users = Table::new("users");
        let role = users.typed::<String>("role");
        let age = users.typed::<i32>("age");
        let sql = SelectBuilder::new()
            .from(&users)
            .where_clause(role.eq("user".to_string()).and(age.gt(18)))
            .or_where(role.eq("admin".to_string()))
            .to_sql(&GenericDialect);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE (\"users\".\"role\" = ? AND \"users\".\"age\" > ?) \
             OR \"users\".\"role\" = ?"
        );
    }

    #[test]
    fn test_join_with_alias() {
        let users = Table::new("users").with_alias("u");
        let orders = Table::new("orders").with_alias("o");
        let id = users.typed::<i64>("id");
        let user_id = orders.typed::<i64>("user_id");
        let sql = SelectBuilder::new()
            .from(&users)
            .inner_join(&orders, id.eq_expr(&user_id))
            .to_sql(&GenericDialect);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" AS \"u\" INNER JOIN \"orders\" AS \"o\" ON \"u\".\"id\" = \"o\".\"user_id\""
        );
    }

    #[test]
    fn test_clause_order_independent_of_configuration() {
        let orders = Table::new("orders");
        let user_id = orders.typed::<i64>("user_id");
        let amount = orders.typed::<f64>("amount");
        let status = orders.typed::<String>("status");
        let prepared = SelectBuilder::new()
            .limit(5)
            .having(sum(&amount).gt(100.0))
            .order_by(sum(&amount).desc())
            .group_by(&user_id)
            .and_where(status.eq("paid".to_string()))
            .column(&user_id)
            .column(sum(&amount).alias("total"))
            .from(&orders)
            .build(&PostgresDialect)
            .unwrap();
        assert_eq!(
            prepared.sql,
            "SELECT \"orders\".\"user_id\", SUM(\"orders\".\"amount\") AS \"total\" FROM \"orders\" \
             WHERE \"orders\".\"status\" = $1 GROUP BY \"orders\".\"user_id\" \
             HAVING SUM(\"orders\".\"amount\") > $2 ORDER BY SUM(\"orders\".\"amount\") DESC LIMIT 5"
        );
        assert_eq!(
            prepared.params,
            vec![Value::Text("paid".into()), Value::Double(100.0)]
        );
    }

    #[test]
    fn test_page() {
        let users = Table::new("users");
        let sql = SelectBuilder::new().from(&users).page(3, 10).to_sql(&GenericDialect);
        assert_eq!(sql, "SELECT * FROM \"users\" LIMIT 10 OFFSET 20");

        let sql = SelectBuilder::new().from(&users).page(0, 0).to_sql(&GenericDialect);
        assert_eq!(sql, "SELECT * FROM \"users\" LIMIT 1 OFFSET 0");
    }

    #[test]
    fn test_offset_without_limit_per_dialect() {
        let users = Table::new("users");
        let qb = SelectBuilder::new().from(&users).offset(20);
        assert_eq!(qb.to_sql(&GenericDialect), "SELECT * FROM \"users\" OFFSET 20");
        assert_eq!(
            qb.to_sql(&SqliteDialect),
            "SELECT * FROM \"users\" LIMIT -1 OFFSET 20"
        );
        assert_eq!(
            qb.to_sql(&MySqlDialect),
            "SELECT * FROM `users` LIMIT 18446744073709551615 OFFSET 20"
        );
    }

    #[test]
    fn test_from_subquery_params_first() {
        let orders = Table::new("orders");
        let amount = orders.typed::<f64>("amount");
        let inner = SelectBuilder::new()
            .from(&orders)
            .column(&amount)
            .where_clause(amount.gt(10.0));
        let big = Table::new("big");
        let outer_amount = big.typed::<f64>("amount");
        let prepared = SelectBuilder::new()
            .from_subquery(inner, "big")
            .where_clause(outer_amount.lt(500.0))
            .build(&PostgresDialect)
            .unwrap();
        assert_eq!(
            prepared.sql,
            "SELECT * FROM (SELECT \"orders\".\"amount\" FROM \"orders\" WHERE \"orders\".\"amount\" > $1) AS \"big\" \
             WHERE \"big\".\"amount\" < $2"
        );
        assert_eq!(prepared.params, vec![Value::Double(10.0), Value::Double(500.0)]);
    }

    #[test]
    fn test_count_plain() {
        let users = Table::new("users");
        let active = users.typed::<bool>("active");
        let qb = SelectBuilder::new()
            .from(&users)
            .where_clause(active.eq(true))
            .order_by(active.asc())
            .page(2, 10);
        assert_eq!(
            qb.count().to_sql(&PostgresDialect),
            "SELECT COUNT(*) FROM \"users\" WHERE \"users\".\"active\" = $1"
        );
    }

    #[test]
    fn test_count_wraps_grouped() {
        let orders = Table::new("orders");
        let user_id = orders.typed::<i64>("user_id");
        let qb = SelectBuilder::new()
            .from(&orders)
            .column(&user_id)
            .group_by(&user_id)
            .having(count(&user_id).gt(5));
        let prepared = qb.count().build(&PostgresDialect).unwrap();
        assert_eq!(
            prepared.sql,
            "SELECT COUNT(*) FROM (SELECT \"orders\".\"user_id\" FROM \"orders\" \
             GROUP BY \"orders\".\"user_id\" HAVING COUNT(\"orders\".\"user_id\") > $1) AS \"t\""
        );
        assert_eq!(prepared.params, vec![Value::BigInt(5)]);
    }

    #[test]
    fn test_star_without_from_is_invalid() {
        let err = SelectBuilder::new().build(&GenericDialect).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_for_update_and_distinct() {
        let jobs = Table::new("jobs");
        let id = jobs.typed::<i64>("id");
        let sql = SelectBuilder::new()
            .distinct()
            .column(&id)
            .from(&jobs)
            .limit(1)
            .for_update()
            .to_sql(&PostgresDialect);
        assert_eq!(
            sql,
            "SELECT DISTINCT \"jobs\".\"id\" FROM \"jobs\" LIMIT 1 FOR UPDATE"
        );
    }

    #[test]
    fn test_for_update_unsupported_on_sqlite() {
        let jobs = Table::new("jobs");
        let err = SelectBuilder::new()
            .from(&jobs)
            .for_update()
            .build(&SqliteDialect)
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(SelectBuilder::new().from(&jobs).for_update().build(&MySqlDialect).is_ok());
    }

    #[test]
    fn test_nested_subqueries_are_validated() {
        let users = Table::new("users");
        let id = users.typed::<i64>("id");

        let in_empty = SelectBuilder::new()
            .from(&users)
            .where_clause(id.in_subquery(SelectBuilder::new()));
        assert!(in_empty.build(&PostgresDialect).unwrap_err().is_structural());

        let locked = SelectBuilder::new().from(&users).for_update();
        let err = SelectBuilder::new()
            .from_subquery(locked, "u")
            .build(&SqliteDialect)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_render_is_repeatable() {
        let users = Table::new("users");
        let age = users.typed::<i32>("age");
        let qb = SelectBuilder::new()
            .from(&users)
            .where_clause(age.in_list([1, 2, 3]));
        let first = qb.build(&PostgresDialect).unwrap();
        let second = qb.build(&PostgresDialect).unwrap();
        assert_eq!(first, second);
    }
}
