//! INSERT query builder.

use crate::dialect::{Dialect, UpsertAction};
use crate::error::{QueryError, QueryResult};
use crate::qb::expr::{Expr, ExprNode};
use crate::qb::param::ParamList;
use crate::qb::traits::{Statement, StatementKind};
use crate::table::{Column, ColumnRef, Table};

/// Conflict resolution action.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// Keep the existing row.
    DoNothing,
    /// Overwrite the listed columns with the proposed values.
    DoUpdate(Vec<ColumnRef>),
    /// Overwrite every inserted column except the conflict target.
    DoUpdateAll,
}

impl ConflictAction {
    /// `DoUpdate` from typed columns.
    pub fn update<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        ConflictAction::DoUpdate(columns.into_iter().map(Into::into).collect())
    }
}

/// ON CONFLICT target and action, shared with the batch builder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OnConflict {
    target: Vec<ColumnRef>,
    action: ConflictAction,
}

impl OnConflict {
    pub(crate) fn new<I, C>(target: I, action: ConflictAction) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            action,
        }
    }

    fn target_names(&self) -> Vec<String> {
        self.target.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns an updating action overwrites, or `None` for DO NOTHING.
    fn update_columns(&self, inserted: &[String]) -> Option<Vec<String>> {
        match &self.action {
            ConflictAction::DoNothing => None,
            ConflictAction::DoUpdate(columns) => {
                Some(columns.iter().map(|c| c.name.clone()).collect())
            }
            ConflictAction::DoUpdateAll => Some(
                inserted
                    .iter()
                    .filter(|c| !self.target.iter().any(|t| &t.name == *c))
                    .cloned()
                    .collect(),
            ),
        }
    }

    pub(crate) fn validate(&self, inserted: &[String], dialect: &dyn Dialect) -> QueryResult<()> {
        if !dialect.supports_upsert() {
            return Err(QueryError::unsupported("ON CONFLICT", dialect.name()));
        }
        if let Some(update) = self.update_columns(inserted) {
            if self.target.is_empty() && dialect.upsert_requires_target() {
                return Err(QueryError::invalid(
                    "ON CONFLICT DO UPDATE requires a conflict target",
                ));
            }
            if update.is_empty() {
                return Err(QueryError::invalid(
                    "ON CONFLICT DO UPDATE has no columns to update",
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn render(&self, inserted: &[String], dialect: &dyn Dialect) -> String {
        let target = self.target_names();
        match self.update_columns(inserted) {
            None => dialect.render_upsert(&target, inserted, UpsertAction::DoNothing),
            Some(update) => dialect.render_upsert(&target, inserted, UpsertAction::Update(&update)),
        }
    }
}

/// Ordered column → value map. Re-setting a column replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Assignments {
    entries: Vec<(ColumnRef, ExprNode)>,
}

impl Assignments {
    pub(crate) fn set(&mut self, column: ColumnRef, value: ExprNode) {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(ColumnRef, ExprNode)> {
        self.entries.iter()
    }

    pub(crate) fn get(&self, column: &ColumnRef) -> Option<&ExprNode> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.entries.iter().map(|(c, _)| c)
    }

    pub(crate) fn validate_nested(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        self.entries
            .iter()
            .try_for_each(|(_, value)| value.validate_nested(dialect))
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.name.clone()).collect()
    }
}

/// `RETURNING "a", "b"`, unqualified.
pub(crate) fn render_returning(columns: &[ColumnRef], dialect: &dyn Dialect) -> String {
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    format!("RETURNING {}", dialect.quote_list(&names))
}

pub(crate) fn validate_returning(columns: &[ColumnRef], dialect: &dyn Dialect) -> QueryResult<()> {
    if !columns.is_empty() && !dialect.supports_returning() {
        return Err(QueryError::unsupported("RETURNING", dialect.name()));
    }
    Ok(())
}

/// INSERT query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    table: Table,
    assignments: Assignments,
    conflict: Option<OnConflict>,
    returning: Vec<ColumnRef>,
}

impl InsertBuilder {
    /// Create a new INSERT query builder.
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Assignments::default(),
            conflict: None,
            returning: Vec::new(),
        }
    }

    /// Set a column value, serialized through the column's type.
    pub fn value<T>(mut self, column: &Column<T>, value: T) -> Self {
        let node = column.value_node(&value);
        self.assignments.set(column.column_ref().clone(), node);
        self
    }

    /// Set an optional column value (None => skip).
    pub fn value_opt<T>(self, column: &Column<T>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.value(column, v),
            None => self,
        }
    }

    /// Set a column to an expression, e.g. `current_timestamp()`.
    pub fn value_expr<T>(mut self, column: &Column<T>, expr: &Expr<T>) -> Self {
        self.assignments
            .set(column.column_ref().clone(), expr.node().clone());
        self
    }

    /// Add an upsert clause.
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

    /// Render the statement, appending bound values to `params`.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let names = self.assignments.names();
        let values: Vec<String> = self
            .assignments
            .iter()
            .map(|(_, v)| v.render(dialect, params))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_identifier(self.table.name()),
            dialect.quote_list(&names),
            values.join(", ")
        );

        if let Some(conflict) = &self.conflict {
            sql.push(' ');
            sql.push_str(&conflict.render(&names, dialect));
        }

        if !self.returning.is_empty() {
            sql.push(' ');
            sql.push_str(&render_returning(&self.returning, dialect));
        }

        sql
    }
}

impl Statement for InsertBuilder {
    fn kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn validate(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        if self.assignments.is_empty() {
            return Err(QueryError::EmptyAssignments { statement: "INSERT" });
        }
        self.assignments.validate_nested(dialect)?;
        if let Some(conflict) = &self.conflict {
            conflict.validate(&self.assignments.names(), dialect)?;
        }
        validate_returning(&self.returning, dialect)
    }

    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        InsertBuilder::render(self, dialect, params)
    }
}
