//! Trait definitions for query builders.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::prepared::PreparedSql;
use crate::qb::param::ParamList;
use std::fmt;

/// Statement category, used for logging and execution routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base trait for all query builders.
///
/// `build` validates first and then renders once; `render` itself never
/// fails and never mutates the builder.
pub trait Statement: Send + Sync + fmt::Debug {
    fn kind(&self) -> StatementKind;

    /// Check builder state against the dialect's capabilities.
    fn validate(&self, _dialect: &dyn Dialect) -> QueryResult<()> {
        Ok(())
    }

    /// Render into `params`, appending bound values in placeholder order.
    fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String;

    /// Validate and render into a standalone [`PreparedSql`].
    fn build(&self, dialect: &dyn Dialect) -> QueryResult<PreparedSql> {
        self.validate(dialect)?;
        let mut params = ParamList::new();
        let sql = self.render(dialect, &mut params);
        Ok(PreparedSql::new(sql, params.into_values()))
    }

    /// Debug helper: the SQL text only, without validation.
    fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let mut params = ParamList::new();
        self.render(dialect, &mut params)
    }
}
