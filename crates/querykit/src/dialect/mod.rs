//! SQL dialect capabilities and text generation.
//!
//! A [`Dialect`] is consulted at render time for everything engine-specific:
//!
//! - Identifier quoting: `"` (ANSI/PostgreSQL/SQLite), `` ` `` (MySQL)
//! - Placeholders: `?` or `$n`
//! - Case-insensitive LIKE, RETURNING, upsert and NULLS FIRST/LAST support
//! - LIMIT/OFFSET quirks
//! - DDL for tables and indexes
//!
//! | Feature | Generic | PostgreSQL | SQLite | MySQL |
//! |---------|---------|------------|--------|-------|
//! | Placeholder | `?` | `$n` | `?` | `?` |
//! | ILIKE | ❌ | ✓ | ❌ | ❌ |
//! | RETURNING | ❌ | ✓ | ✓ (3.35+) | ❌ |
//! | Upsert | ❌ | ON CONFLICT | ON CONFLICT | ON DUPLICATE KEY |
//! | NULLS FIRST/LAST | ✓ | ✓ | ✓ (3.30+) | ❌ |
//! | GROUPS frame | ✓ | ✓ (11+) | ✓ (3.28+) | ❌ |
//!
//! Builders fall back to `LOWER(x) LIKE LOWER(?)` without ILIKE, and to a
//! `CASE WHEN x IS NULL` sort key without NULLS ordering. RETURNING and upsert
//! have no fallback and fail validation instead.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::ddl::{ColumnDef, IndexDef, SqlType, TableDef};
use std::fmt;

/// Conflict resolution passed to [`Dialect::render_upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction<'a> {
    /// Keep the existing row.
    DoNothing,
    /// Overwrite these (unquoted) columns with the proposed values.
    Update(&'a [String]),
}

/// SQL dialect trait.
///
/// The default implementations follow ANSI SQL where possible.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Dialect name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String {
        quote_double(ident)
    }

    /// Placeholder text for the 1-based parameter `index`.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Whether `ILIKE` is native.
    fn supports_ilike(&self) -> bool {
        false
    }

    /// Whether INSERT/UPDATE/DELETE accept a RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether INSERT accepts an upsert clause.
    fn supports_upsert(&self) -> bool {
        false
    }

    /// Whether SELECT accepts a trailing `FOR UPDATE` row lock.
    fn supports_for_update(&self) -> bool {
        true
    }

    /// Whether an updating upsert needs an explicit conflict target.
    fn upsert_requires_target(&self) -> bool {
        true
    }

    /// Render the upsert clause appended to an INSERT of `columns`.
    ///
    /// Default is the `ON CONFLICT` form shared by PostgreSQL and SQLite.
    fn render_upsert(
        &self,
        target: &[String],
        _columns: &[String],
        action: UpsertAction<'_>,
    ) -> String {
        let mut sql = String::from("ON CONFLICT");
        if !target.is_empty() {
            sql.push_str(" (");
            sql.push_str(&self.quote_list(target));
            sql.push(')');
        }
        match action {
            UpsertAction::DoNothing => sql.push_str(" DO NOTHING"),
            UpsertAction::Update(columns) => {
                let sets: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let q = self.quote_identifier(c);
                        format!("{q} = EXCLUDED.{q}")
                    })
                    .collect();
                sql.push_str(" DO UPDATE SET ");
                sql.push_str(&sets.join(", "));
            }
        }
        sql
    }

    /// Whether ORDER BY accepts NULLS FIRST/LAST.
    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    /// Whether window frames accept GROUPS. Without it, GROUPS frames
    /// render as ROWS.
    fn supports_groups_frame(&self) -> bool {
        false
    }

    /// Expression for the current timestamp.
    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    /// Pagination clause, `None` when neither bound is set.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {l}")),
            (None, Some(o)) => Some(format!("OFFSET {o}")),
            (Some(l), Some(o)) => Some(format!("LIMIT {l} OFFSET {o}")),
        }
    }

    /// Maximum number of bound parameters per statement, if the engine has one.
    fn max_params(&self) -> Option<usize> {
        None
    }

    /// Concrete type name for DDL.
    fn type_name(&self, ty: SqlType) -> String {
        match ty {
            SqlType::Boolean => "BOOLEAN".into(),
            SqlType::SmallInt => "SMALLINT".into(),
            SqlType::Integer => "INTEGER".into(),
            SqlType::BigInt => "BIGINT".into(),
            SqlType::Real => "REAL".into(),
            SqlType::Double => "DOUBLE PRECISION".into(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "TEXT".into(),
            SqlType::Bytes => "BLOB".into(),
            SqlType::Date => "DATE".into(),
            SqlType::Timestamp => "TIMESTAMP".into(),
            SqlType::TimestampTz => "TIMESTAMP WITH TIME ZONE".into(),
            SqlType::Uuid => "CHAR(36)".into(),
            SqlType::Json => "JSON".into(),
        }
    }

    /// Identity/auto-increment column attribute.
    fn auto_increment(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    /// One column of a CREATE TABLE statement.
    fn column_definition(&self, column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.type_name(column.sql_type)
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if column.auto_increment {
            sql.push(' ');
            sql.push_str(self.auto_increment());
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    /// CREATE TABLE statement.
    fn create_table(&self, table: &TableDef) -> String {
        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        if !table.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.quote_list(&table.primary_key)));
        }
        format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier(&table.name),
            parts.join(", ")
        )
    }

    /// DROP TABLE statement.
    fn drop_table(&self, name: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(name))
    }

    /// CREATE INDEX statement.
    fn create_index(&self, index: &IndexDef) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.table),
            self.quote_list(&index.columns)
        )
    }

    /// DROP INDEX statement.
    fn drop_index(&self, index: &IndexDef) -> String {
        format!("DROP INDEX {}", self.quote_identifier(&index.name))
    }

    /// Quote and comma-join a list of identifiers.
    fn quote_list(&self, idents: &[String]) -> String {
        idents
            .iter()
            .map(|i| self.quote_identifier(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Quote with double quotes, escaping `"` as `""`.
pub fn quote_double(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Quote with backticks, escaping `` ` `` as ``` `` ```.
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
