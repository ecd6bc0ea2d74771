//! Table handles and typed column references.

use crate::dialect::Dialect;
use crate::qb::{Expr, ExprNode, IntoNode};
use crate::types::{ColumnType, SqlValue};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A table, optionally aliased.
///
/// Columns created from an aliased table are qualified with the alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    name: String,
    alias: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Return a copy of this table referenced under `alias`.
    pub fn with_alias(&self, alias: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            alias: Some(alias.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name used to qualify columns: the alias if set, otherwise the table name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Declare a column with an explicit column type.
    pub fn column<T: 'static>(
        &self,
        name: impl Into<String>,
        ty: impl ColumnType<T> + 'static,
    ) -> Column<T> {
        Column::new(
            ColumnRef::new(self.qualifier(), name),
            Arc::new(ty) as Arc<dyn ColumnType<T>>,
        )
    }

    /// Declare a column using the default column type for `T`.
    pub fn typed<T: SqlValue>(&self, name: impl Into<String>) -> Column<T> {
        Column::new(ColumnRef::new(self.qualifier(), name), T::column_type())
    }

    /// `"users"` or `"users" AS "u"`.
    pub(crate) fn render_source(&self, dialect: &dyn Dialect) -> String {
        let name = dialect.quote_identifier(&self.name);
        match &self.alias {
            Some(alias) => format!("{name} AS {}", dialect.quote_identifier(alias)),
            None => name,
        }
    }
}

/// Untyped column identity.
///
/// Two references naming the same qualifier and column are equal regardless
/// of which [`Column`] produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// `"table"."column"`
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        format!(
            "{}.{}",
            dialect.quote_identifier(&self.table),
            dialect.quote_identifier(&self.name)
        )
    }
}

impl<T> From<&Column<T>> for ColumnRef {
    fn from(column: &Column<T>) -> Self {
        column.column.clone()
    }
}

/// A typed column. Dereferences to its [`Expr<T>`], so every expression
/// method is available directly.
///
/// Not `PartialEq`, so `column.eq(v)` resolves to [`Expr::eq`]. Compare
/// [`Column::column_ref`] for identity.
pub struct Column<T> {
    column: ColumnRef,
    expr: Expr<T>,
}

impl<T: 'static> Column<T> {
    pub fn new(column: ColumnRef, ty: Arc<dyn ColumnType<T>>) -> Self {
        let expr = Expr::from_parts(ExprNode::Column(column.clone()), ty);
        Self { column, expr }
    }
}

impl<T> Column<T> {
    pub fn column_ref(&self) -> &ColumnRef {
        &self.column
    }

    /// Unqualified column name.
    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn expr(&self) -> &Expr<T> {
        &self.expr
    }
}

impl<T> Deref for Column<T> {
    type Target = Expr<T>;

    fn deref(&self) -> &Expr<T> {
        &self.expr
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            expr: self.expr.clone(),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("table", &self.column.table)
            .field("name", &self.column.name)
            .finish()
    }
}

impl<T> IntoNode for Column<T> {
    fn into_node(self) -> ExprNode {
        ExprNode::Column(self.column)
    }
}

impl<T> IntoNode for &Column<T> {
    fn into_node(self) -> ExprNode {
        ExprNode::Column(self.column.clone())
    }
}
