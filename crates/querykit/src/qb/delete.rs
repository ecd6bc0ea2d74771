//! DELETE query builder.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::qb::insert::{render_returning, validate_returning};
use crate::qb::param::ParamList;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{Statement, StatementKind};
use crate::table::{ColumnRef, Table};

/// DELETE query builder.
///
/// Without a WHERE condition the statement deletes every row.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    table: Table,
    where_clause: Option<Predicate>,
    returning: Vec<ColumnRef>,
}

impl DeleteBuilder {
    /// Create a new DELETE query builder.
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

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

    /// Append a RETURNING column.
    pub fn returning(mut self, column: impl Into<ColumnRef>) -> Self {
        self.returning.push(column.into());
        self
    }

    /// Render the statement, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let mut sql = format!("DELETE FROM {}", self.table.render_source(dialect));

        if let Some(predicate) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.render(dialect, params));
        }

        if !self.returning.is_empty() {
            sql.push(' ');
            sql.push_str(&render_returning(&self.returning, dialect));
        }

        sql
    }
}

impl Statement for DeleteBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        if let Some(predicate) = &self.where_clause {
            predicate.validate_nested(dialect)?;
        }
        validate_returning(&self.returning, dialect)
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        DeleteBuilder::render(self, dialect, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect};
    use crate::qb::select::SelectBuilder;
    use crate::value::Value;

    #[test]
    fn test_delete_basic() {
        let users = Table::new("users");
        let id = users.typed::<i64>("id");
        let prepared = DeleteBuilder::new(&users)
            .where_clause(id.eq(1))
            .build(&PostgresDialect)
            .unwrap();
        assert_eq!(prepared.sql, "DELETE FROM \"users\" WHERE \"users\".\"id\" = $1");
        assert_eq!(prepared.params, vec![Value::BigInt(1)]);
    }

    #[test]
    fn test_delete_without_where() {
        let sessions = Table::new("sessions");
        assert_eq!(
            DeleteBuilder::new(&sessions).to_sql(&GenericDialect),
            "DELETE FROM \"sessions\""
        );
    }

    #[test]
    fn test_delete_in_subquery_returning() {
        let sessions = Table::new("sessions");
        let user_id = sessions.typed::<i64>("user_id");
        let token = sessions.typed::<String>("token");
        let users = Table::new("users");
        let id = users.typed::<i64>("id");
        let banned = users.typed::<bool>("banned");
        let prepared = DeleteBuilder::new(&sessions)
            .where_clause(user_id.in_subquery(
                SelectBuilder::new().column(&id).from(&users).where_clause(banned.eq(true)),
            ))
            .and_where(token.ne("keep".to_string()))
            .returning(&token)
            .build(&SqliteDialect)
            .unwrap();
        assert_eq!(
            prepared.sql,
            "DELETE FROM \"sessions\" WHERE \"sessions\".\"user_id\" IN \
             (SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"banned\" = ?) \
             AND \"sessions\".\"token\" <> ? RETURNING \"token\""
        );
        assert_eq!(
            prepared.params,
            vec![Value::Bool(true), Value::Text("keep".into())]
        );
    }

    #[test]
    fn test_returning_unsupported() {
        let users = Table::new("users");
        let id = users.typed::<i64>("id");
        let err = DeleteBuilder::new(&users)
            .returning(&id)
            .build(&MySqlDialect)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_delete_rejects_invalid_subquery() {
        let sessions = Table::new("sessions");
        let user_id = sessions.typed::<i64>("user_id");
        let err = DeleteBuilder::new(&sessions)
            .where_clause(user_id.in_subquery(SelectBuilder::new()))
            .build(&GenericDialect)
            .unwrap_err();
        assert!(err.is_structural());
    }
}
