//! Typed query builders and the expression layer they compose.
//!
//! # Features
//!
//! - **Typed expressions**: every column and literal carries the
//!   [`ColumnType`](crate::types::ColumnType) that serializes its values
//! - **Single-pass rendering**: placeholders are numbered as values are bound,
//!   never by rewriting the finished SQL
//! - **Dialect-aware**: quoting, placeholders, upsert, RETURNING and
//!   LIMIT/OFFSET all come from the [`Dialect`](crate::dialect::Dialect)
//!
//! # Usage
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let users = Table::new("users");
//! let id = users.typed::<i64>("id");
//! let age = users.typed::<i32>("age");
//! let active = users.typed::<bool>("active");
//!
//! // SELECT
//! let adults = qb::select()
//!     .column(&id)
//!     .from(&users)
//!     .where_clause(age.gt(18).and(active.eq(true)))
//!     .order_by(id.asc())
//!     .page(1, 20)
//!     .build(&PostgresDialect)?;
//!
//! // UPDATE
//! let deactivate = qb::update(&users)
//!     .set(&active, false)
//!     .where_clause(id.eq(42))
//!     .build(&PostgresDialect)?;
//! ```

mod batch;
mod delete;
mod expr;
mod func;
mod insert;
mod param;
mod predicate;
mod select;
mod traits;
mod update;
mod window;


pub use batch::{BatchInsertBuilder, BatchRow, BatchStrategy};
pub use delete::DeleteBuilder;
pub use expr::{ArithOp, Expr, ExprNode, IntoNode, current_timestamp, lit, raw, scalar};
pub use func::{
    CaseBuilder, avg, call, case_when, coalesce, count, count_distinct, count_star, dense_rank,
    first_value, lag, last_value, lead, lower, max, min, ntile, rank, row_number, sum, upper,
};
pub use insert::{ConflictAction, InsertBuilder};
pub use param::ParamList;
pub use predicate::{
    CompareOp, Predicate, Quantifier, and_all, exists, not, not_exists, or_any,
};
pub use select::{FromSource, JoinClause, JoinKind, SelectBuilder};
pub use traits::{Statement, StatementKind};
pub use update::UpdateBuilder;
pub use window::{FrameBound, FrameKind, NullsOrder, OrderItem, SortDir, WindowFrame, WindowSpec};

use crate::table::Table;

/// Create an empty SELECT builder.
///
/// # Example
/// ```ignore
/// let q = querykit::qb::select().from(&users).where_clause(id.eq(1));
/// ```
pub fn select() -> SelectBuilder {
    SelectBuilder::new()
}

/// Create an INSERT builder for the given table.
pub fn insert(table: &Table) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Create a batch INSERT builder for the given table.
pub fn batch_insert(table: &Table) -> BatchInsertBuilder {
    BatchInsertBuilder::new(table)
}

/// Create an UPDATE builder for the given table.
pub fn update(table: &Table) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Create a DELETE builder for the given table.
pub fn delete(table: &Table) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
