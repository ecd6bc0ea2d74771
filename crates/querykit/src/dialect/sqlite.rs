//! SQLite dialect.
//!
//! SQLite differences from ANSI:
//! - Type affinities instead of strict types (`INTEGER`, `REAL`, `TEXT`, `BLOB`, `NUMERIC`)
//! - `INTEGER PRIMARY KEY AUTOINCREMENT` for generated keys
//! - OFFSET requires a LIMIT (`LIMIT -1` means unbounded)
//! - RETURNING since 3.35, NULLS FIRST/LAST since 3.30

use super::Dialect;
use crate::ddl::{ColumnDef, SqlType};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_upsert(&self) -> bool {
        true
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_groups_frame(&self) -> bool {
        true
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {l}")),
            (None, Some(o)) => Some(format!("LIMIT -1 OFFSET {o}")),
            (Some(l), Some(o)) => Some(format!("LIMIT {l} OFFSET {o}")),
        }
    }

    // SQLITE_MAX_VARIABLE_NUMBER default since 3.32.
    fn max_params(&self) -> Option<usize> {
        Some(32_766)
    }

    fn type_name(&self, ty: SqlType) -> String {
        match ty {
            SqlType::Boolean | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                "INTEGER".into()
            }
            SqlType::Real | SqlType::Double => "REAL".into(),
            SqlType::Decimal { .. } => "NUMERIC".into(),
            SqlType::Bytes => "BLOB".into(),
            SqlType::Varchar(_)
            | SqlType::Text
            | SqlType::Date
            | SqlType::Timestamp
            | SqlType::TimestampTz
            | SqlType::Uuid
            | SqlType::Json => "TEXT".into(),
        }
    }

    fn column_definition(&self, column: &ColumnDef) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.type_name(column.sql_type)
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
            if column.auto_increment {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}
