//! Convenient imports for typical `querykit` usage.
//!
//! ```ignore
//! use querykit::prelude::*;
//! ```

pub use crate::qb::{
    self, BatchRow, CompareOp, ConflictAction, Expr, FrameBound, OrderItem, Predicate, Statement,
    WindowSpec, and_all, case_when, coalesce, count, count_star, current_timestamp, exists, lit,
    not, not_exists, or_any, raw, row_number, sum,
};
pub use crate::types::{ColumnType, Nullable, SqlValue};
pub use crate::{
    BatchOutcome, Column, CompileConfig, Compiler, Dialect, DialectKind, Executor, GenericDialect,
    MySqlDialect, PostgresDialect, PreparedSql, QueryError, QueryResult, SqliteDialect, Table,
    Value,
};
