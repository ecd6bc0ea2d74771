//! # querykit
//!
//! Typed SQL expressions and a dialect-aware, positionally-parameterized
//! query compiler.
//!
//! ## Features
//!
//! - **Typed AST**: columns, literals and predicates carry the column type
//!   that serializes their values
//! - **Placeholder order by construction**: each value is bound at the moment
//!   its placeholder is written, across subqueries, joins, window functions,
//!   CASE and arithmetic
//! - **Pluggable dialects**: generic ANSI, PostgreSQL, SQLite and MySQL, or
//!   your own [`Dialect`]
//! - **No driver required**: compile to [`PreparedSql`]; the optional
//!   `postgres` feature executes through `tokio-postgres`
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let employees = Table::new("employees");
//! let department = employees.typed::<String>("department");
//! let salary = employees.typed::<f64>("salary");
//!
//! let ranked = qb::select()
//!     .column(&department)
//!     .column(
//!         row_number()
//!             .over(WindowSpec::new().partition_by(&department).order_by(salary.desc()))
//!             .alias("rn"),
//!     )
//!     .from(&employees)
//!     .build(&PostgresDialect)?;
//! ```

pub mod compiler;
pub mod config;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod exec;
pub mod prelude;
pub mod prepared;
pub mod qb;
pub mod table;
pub mod types;
pub mod value;

pub use compiler::{BatchOutcome, Compiler};
pub use config::{CompileConfig, DialectKind};
pub use dialect::{Dialect, GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use error::{QueryError, QueryResult};
pub use exec::Executor;
pub use prepared::PreparedSql;
pub use table::{Column, ColumnRef, Table};
pub use value::Value;
