//! Compiler configuration.

pub use crate::qb::BatchStrategy;

use crate::dialect::{Dialect, GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect};
use crate::error::{QueryError, QueryResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Built-in dialect selector, parsed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DialectKind {
    #[default]
    Generic,
    Postgres,
    Sqlite,
    MySql,
}

impl DialectKind {
    /// Instantiate the dialect.
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Generic => Box::new(GenericDialect),
            DialectKind::Postgres => Box::new(PostgresDialect),
            DialectKind::Sqlite => Box::new(SqliteDialect),
            DialectKind::MySql => Box::new(MySqlDialect),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DialectKind::Generic => "generic",
            DialectKind::Postgres => "postgres",
            DialectKind::Sqlite => "sqlite",
            DialectKind::MySql => "mysql",
        }
    }
}

impl FromStr for DialectKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(DialectKind::Generic),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            _ => Err(QueryError::UnknownDialect(s.to_string())),
        }
    }
}

impl TryFrom<String> for DialectKind {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for [`Compiler`](crate::compiler::Compiler).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Target dialect.
    pub dialect: DialectKind,
    /// How batch inserts become statements.
    pub batch_strategy: BatchStrategy,
    /// Parameter limit per statement; overrides the dialect's own limit.
    pub max_params: Option<usize>,
    /// Whether to emit a `debug` event per compiled statement.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Generic,
            batch_strategy: BatchStrategy::PerRow,
            max_params: None,
            log_sql: true,
            max_logged_sql_length: Some(200),
        }
    }
}

impl CompileConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// dialect = "postgres"
    /// batch_strategy = "multi_row"
    /// max_params = 1000
    /// ```
    pub fn from_toml_str(s: &str) -> QueryResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Set the target dialect.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the batch strategy.
    pub fn batch_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.batch_strategy = strategy;
        self
    }

    /// Cap bound values per statement.
    pub fn max_params(mut self, max: usize) -> Self {
        self.max_params = Some(max);
        self
    }

    /// Disable statement logging.
    pub fn no_logging(mut self) -> Self {
        self.log_sql = false;
        self
    }

    /// Set maximum logged SQL length.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_kind_parse() {
        assert_eq!("pg".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!(" MySQL ".parse::<DialectKind>().unwrap(), DialectKind::MySql);
        assert_eq!("sqlite".parse::<DialectKind>().unwrap(), DialectKind::Sqlite);
        assert!(matches!(
            "oracle".parse::<DialectKind>(),
            Err(QueryError::UnknownDialect(name)) if name == "oracle"
        ));
    }

    #[test]
    fn test_from_toml() {
        let config = CompileConfig::from_toml_str(
            r#"
            dialect = "postgres"
            batch_strategy = "multi_row"
            max_params = 1000
            log_sql = false
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.batch_strategy, BatchStrategy::MultiRow);
        assert_eq!(config.max_params, Some(1000));
        assert!(!config.log_sql);
        assert_eq!(config.max_logged_sql_length, Some(200));
    }

    #[test]
    fn test_from_toml_rejects_unknown_dialect() {
        let err = CompileConfig::from_toml_str(r#"dialect = "oracle""#).unwrap_err();
        assert!(matches!(err, QueryError::Config(_)));
    }

    #[test]
    fn test_builder_setters() {
        let config = CompileConfig::new()
            .dialect(DialectKind::Sqlite)
            .max_params(10)
            .no_logging()
            .no_truncate();
        assert_eq!(config.dialect.dialect().name(), "sqlite");
        assert_eq!(config.max_params, Some(10));
        assert!(!config.log_sql);
        assert_eq!(config.max_logged_sql_length, None);
    }
}
