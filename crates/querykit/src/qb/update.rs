//! UPDATE query builder.

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::qb::expr::{ArithOp, Expr, ExprNode};
use crate::qb::insert::{Assignments, render_returning, validate_returning};
use crate::qb::param::ParamList;
use crate::qb::predicate::Predicate;
use crate::qb::traits::{Statement, StatementKind};
use crate::table::{Column, ColumnRef, Table};
use crate::value::Value;

/// UPDATE query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: Table,
    assignments: Assignments,
    where_clause: Option<Predicate>,
    returning: Vec<ColumnRef>,
}

impl UpdateBuilder {
    /// Create a new UPDATE query builder.
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Assignments::default(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    // ==================== SET ====================

    /// `SET col = ?`
    pub fn set<T>(mut self, column: &Column<T>, value: T) -> Self {
        let node = column.value_node(&value);
        self.assignments.set(column.column_ref().clone(), node);
        self
    }

    /// `SET col = NULL`, bound as a NULL parameter.
    pub fn set_null<T>(mut self, column: &Column<Option<T>>) -> Self {
        self.assignments
            .set(column.column_ref().clone(), ExprNode::Literal(Value::Null));
        self
    }

    /// `SET col = <expr>`
    pub fn set_expr<T>(mut self, column: &Column<T>, expr: &Expr<T>) -> Self {
        self.assignments
            .set(column.column_ref().clone(), expr.node().clone());
        self
    }

    fn step<T>(mut self, column: &Column<T>, op: ArithOp, by: T) -> Self {
        let node = ExprNode::Binary {
            left: Box::new(column.node().clone()),
            op,
            right: Box::new(column.value_node(&by)),
        };
        self.assignments.set(column.column_ref().clone(), node);
        self
    }

    /// `SET col = col + ?`
    pub fn increment<T>(self, column: &Column<T>, by: T) -> Self {
        self.step(column, ArithOp::Add, by)
    }

    /// `SET col = col - ?`
    pub fn decrement<T>(self, column: &Column<T>, by: T) -> Self {
        self.step(column, ArithOp::Sub, by)
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

    /// Append a RETURNING column.
    pub fn returning(mut self, column: impl Into<ColumnRef>) -> Self {
        self.returning.push(column.into());
        self
    }

    /// Render the statement, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, value)| {
                let value = value.render(dialect, params);
                format!("{} = {value}", dialect.quote_identifier(&column.name))
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table.render_source(dialect),
            sets.join(", ")
        );

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

impl Statement for UpdateBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        if self.assignments.is_empty() {
            return Err(QueryError::EmptyAssignments { statement: "UPDATE" });
        }
        self.assignments.validate_nested(dialect)?;
        if let Some(predicate) = &self.where_clause {
            predicate.validate_nested(dialect)?;
        }
        validate_returning(&self.returning, dialect)
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        UpdateBuilder::render(self, dialect, params)
    }
}
