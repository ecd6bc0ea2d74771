//! MySQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - `ON DUPLICATE KEY UPDATE` for upserts; the conflict target is implied by
//!   the table's unique keys
//! - No RETURNING clause (use LAST_INSERT_ID())
//! - No NULLS FIRST/LAST
//! - OFFSET requires a LIMIT
//! - `DROP INDEX ... ON table`

use super::{Dialect, UpsertAction, quote_backtick};
use crate::ddl::{IndexDef, SqlType};

/// MySQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_backtick(ident)
    }

    fn supports_upsert(&self) -> bool {
        true
    }

    fn upsert_requires_target(&self) -> bool {
        false
    }

    fn render_upsert(
        &self,
        target: &[String],
        columns: &[String],
        action: UpsertAction<'_>,
    ) -> String {
        let sets: Vec<String> = match action {
            UpsertAction::Update(update) => update
                .iter()
                .map(|c| {
                    let q = self.quote_identifier(c);
                    format!("{q} = VALUES({q})")
                })
                .collect(),
            // No DO NOTHING form: a self-assignment leaves the row untouched.
            UpsertAction::DoNothing => target
                .first()
                .or_else(|| columns.first())
                .map(|c| {
                    let q = self.quote_identifier(c);
                    vec![format!("{q} = {q}")]
                })
                .unwrap_or_default(),
        };
        format!("ON DUPLICATE KEY UPDATE {}", sets.join(", "))
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(l), None) => Some(format!("LIMIT {l}")),
            (None, Some(o)) => Some(format!("LIMIT {} OFFSET {o}", u64::MAX)),
            (Some(l), Some(o)) => Some(format!("LIMIT {l} OFFSET {o}")),
        }
    }

    fn max_params(&self) -> Option<usize> {
        Some(65_535)
    }

    fn type_name(&self, ty: SqlType) -> String {
        match ty {
            SqlType::Boolean => "TINYINT(1)".into(),
            SqlType::Double => "DOUBLE".into(),
            SqlType::Bytes => "BLOB".into(),
            SqlType::Timestamp => "DATETIME(6)".into(),
            SqlType::TimestampTz => "TIMESTAMP(6)".into(),
            SqlType::Uuid => "CHAR(36)".into(),
            SqlType::Json => "JSON".into(),
            SqlType::SmallInt => "SMALLINT".into(),
            SqlType::Integer => "INT".into(),
            SqlType::BigInt => "BIGINT".into(),
            SqlType::Real => "FLOAT".into(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "TEXT".into(),
            SqlType::Date => "DATE".into(),
        }
    }

    fn auto_increment(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn drop_index(&self, index: &IndexDef) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(&index.name),
            self.quote_identifier(&index.table)
        )
    }
}
