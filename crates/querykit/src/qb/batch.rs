//! Multi-row INSERT builder.

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::prepared::PreparedSql;
use crate::qb::expr::{Expr, ExprNode};
use crate::qb::insert::{Assignments, ConflictAction, OnConflict, render_returning, validate_returning};
use crate::qb::param::ParamList;
use crate::table::{Column, ColumnRef, Table};
use serde::Deserialize;
use std::ops::Range;

/// How a batch is turned into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStrategy {
    /// One statement per row; every statement has the same SQL text.
    #[default]
    PerRow,
    /// `VALUES (...), (...)` statements, chunked by the parameter limit.
    MultiRow,
}

/// One row of a batch insert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRow {
    assignments: Assignments,
}

impl BatchRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, serialized through the column's type.
    pub fn value<T>(mut self, column: &Column<T>, value: T) -> Self {
        let node = column.value_node(&value);
        self.assignments.set(column.column_ref().clone(), node);
        self
    }

    /// Set a column to an expression.
    pub fn value_expr<T>(mut self, column: &Column<T>, expr: &Expr<T>) -> Self {
        self.assignments
            .set(column.column_ref().clone(), expr.node().clone());
        self
    }
}

/// Batch INSERT builder.
///
/// Every row must assign the same set of columns; values are emitted in the
/// first row's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInsertBuilder {
    table: Table,
    rows: Vec<BatchRow>,
    conflict: Option<OnConflict>,
    returning: Vec<ColumnRef>,
    strategy: BatchStrategy,
}

impl BatchInsertBuilder {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            rows: Vec::new(),
            conflict: None,
            returning: Vec::new(),
            strategy: BatchStrategy::default(),
        }
    }

    /// Append a row.
    pub fn row(mut self, row: BatchRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Append several rows.
    pub fn rows(mut self, rows: impl IntoIterator<Item = BatchRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Add an upsert clause to every generated statement.
    pub fn on_conflict<I, C>(mut self, target: I, action: ConflictAction) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        self.conflict = Some(OnConflict::new(target, action));
        self
    }

    /// Append a RETURNING column.
    pub fn returning(mut self, column: impl Into<ColumnRef>) -> Self {
        self.returning.push(column.into());
        self
    }

    /// Choose per-row or multi-row statements.
    pub fn strategy(mut self, strategy: BatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every row carries the first row's column set.
    pub fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        let Some(first) = self.rows.first() else {
            return Ok(());
        };
        if first.assignments.is_empty() {
            return Err(QueryError::EmptyAssignments {
                statement: "INSERT",
            });
        }
        for (index, row) in self.rows.iter().enumerate().skip(1) {
            let same_set = row.assignments.len() == first.assignments.len()
                && first
                    .assignments
                    .columns()
                    .all(|c| row.assignments.get(c).is_some());
            if !same_set {
                return Err(QueryError::HeterogeneousBatch {
                    row: index,
                    expected: first.assignments.names().join(", "),
                    found: row.assignments.names().join(", "),
                });
            }
        }
        for row in &self.rows {
            row.assignments.validate_nested(dialect)?;
        }
        if let Some(conflict) = &self.conflict {
            conflict.validate(&first.assignments.names(), dialect)?;
        }
        validate_returning(&self.returning, dialect)
    }

    /// Build with the configured strategy and the dialect's parameter limit.
    pub fn build(&self, dialect: &dyn Dialect) -> QueryResult<Vec<PreparedSql>> {
        self.build_with(dialect, self.strategy, dialect.max_params())
    }

    /// Build with an explicit strategy and parameter limit.
    ///
    /// Zero rows yield zero statements.
    pub fn build_with(
        &self,
        dialect: &dyn Dialect,
        strategy: BatchStrategy,
        max_params: Option<usize>,
    ) -> QueryResult<Vec<PreparedSql>> {
        Ok(self
            .build_spans(dialect, strategy, max_params)?
            .into_iter()
            .map(|(_, prepared)| prepared)
            .collect())
    }

    /// Like [`build_with`](Self::build_with), pairing each statement with the
    /// range of input rows it inserts.
    pub fn build_spans(
        &self,
        dialect: &dyn Dialect,
        strategy: BatchStrategy,
        max_params: Option<usize>,
    ) -> QueryResult<Vec<(Range<usize>, PreparedSql)>> {
        self.validate(dialect)?;
        let Some(first) = self.rows.first() else {
            return Ok(Vec::new());
        };
        let order: Vec<ColumnRef> = first.assignments.columns().cloned().collect();
        let names = first.assignments.names();

        let rows: Vec<Vec<&ExprNode>> = self
            .rows
            .iter()
            .map(|row| {
                order
                    .iter()
                    .filter_map(|c| row.assignments.get(c))
                    .collect()
            })
            .collect();

        let spans: Vec<Range<usize>> = match strategy {
            BatchStrategy::PerRow => (0..rows.len()).map(|i| i..i + 1).collect(),
            BatchStrategy::MultiRow => chunk_rows(&rows, dialect, max_params),
        };
        Ok(spans
            .into_iter()
            .map(|span| {
                let prepared = self.render_chunk(&names, &rows[span.clone()], dialect);
                (span, prepared)
            })
            .collect())
    }

    fn render_chunk(
        &self,
        names: &[String],
        rows: &[Vec<&ExprNode>],
        dialect: &dyn Dialect,
    ) -> PreparedSql {
        let mut params = ParamList::new();
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| format!("({})", render_row(row, dialect, &mut params)))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            dialect.quote_identifier(self.table.name()),
            dialect.quote_list(names),
            tuples.join(", ")
        );
        if let Some(conflict) = &self.conflict {
            sql.push(' ');
            sql.push_str(&conflict.render(names, dialect));
        }
        if !self.returning.is_empty() {
            sql.push(' ');
            sql.push_str(&render_returning(&self.returning, dialect));
        }
        PreparedSql::new(sql, params.into_values())
    }
}

fn render_row(row: &[&ExprNode], dialect: &dyn Dialect, params: &mut ParamList) -> String {
    row.iter()
        .map(|v| v.render(dialect, params))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split rows so no chunk binds more than `max_params` values.
///
/// A row's cost is the number of values it binds, which can differ between
/// rows when some use expressions. A single row over the limit gets a chunk
/// of its own.
fn chunk_rows(
    rows: &[Vec<&ExprNode>],
    dialect: &dyn Dialect,
    max_params: Option<usize>,
) -> Vec<Range<usize>> {
    let Some(limit) = max_params else {
        return vec![0..rows.len()];
    };

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (i, row) in rows.iter().enumerate() {
        let mut scratch = ParamList::new();
        render_row(row, dialect, &mut scratch);
        let cost = scratch.len();
        if i > start && used + cost > limit {
            chunks.push(start..i);
            start = i;
            used = 0;
        }
        used += cost;
    }
    chunks.push(start..rows.len());
    chunks
}
