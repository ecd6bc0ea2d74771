//! Compiled statement: SQL text plus its ordered parameters.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SQL text and the values its placeholders bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

impl PreparedSql {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Count `?` and `$n` markers outside quoted literals and identifiers.
    ///
    /// For statements built without raw fragments this always equals
    /// `params.len()`.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut quote: Option<char> = None;
        let mut chars = self.sql.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => count += 1,
                '$' if chars.peek().is_some_and(|n| n.is_ascii_digit()) => {
                    count += 1;
                    while chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                        chars.next();
                    }
                }
                _ => {}
            }
        }
        count
    }

    /// Stable SHA-256 key over the SQL text and the canonical form of each
    /// parameter, as 64 lowercase hex characters.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        for value in &self.params {
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Get parameters as references compatible with tokio-postgres.
    #[cfg(feature = "postgres")]
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.params
            .iter()
            .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

impl fmt::Display for PreparedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
