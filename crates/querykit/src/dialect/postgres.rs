//! PostgreSQL dialect.
//!
//! PostgreSQL differences from ANSI:
//! - Numbered `$n` placeholders
//! - Native `ILIKE`
//! - RETURNING on INSERT/UPDATE/DELETE
//! - `ON CONFLICT ... DO NOTHING | DO UPDATE SET c = EXCLUDED.c`
//! - `BYTEA`, `TIMESTAMPTZ`, `UUID`, `JSONB`

use super::Dialect;
use crate::ddl::SqlType;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_upsert(&self) -> bool {
        true
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_groups_frame(&self) -> bool {
        true
    }

    // Wire protocol limit (Int16 parameter count).
    fn max_params(&self) -> Option<usize> {
        Some(65_535)
    }

    fn type_name(&self, ty: SqlType) -> String {
        match ty {
            SqlType::Decimal { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            SqlType::Bytes => "BYTEA".into(),
            SqlType::TimestampTz => "TIMESTAMPTZ".into(),
            SqlType::Uuid => "UUID".into(),
            SqlType::Json => "JSONB".into(),
            SqlType::Boolean => "BOOLEAN".into(),
            SqlType::SmallInt => "SMALLINT".into(),
            SqlType::Integer => "INTEGER".into(),
            SqlType::BigInt => "BIGINT".into(),
            SqlType::Real => "REAL".into(),
            SqlType::Double => "DOUBLE PRECISION".into(),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "TEXT".into(),
            SqlType::Date => "DATE".into(),
            SqlType::Timestamp => "TIMESTAMP".into(),
        }
    }
}
