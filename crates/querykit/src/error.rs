//! Error types for querykit

use thiserror::Error;

/// Result type alias for querykit operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while configuring, building or executing statements.
///
/// Rendering itself never fails: every check runs in `validate` before the
/// single render pass.
#[derive(Debug, Error)]
pub enum QueryError {
    /// INSERT or UPDATE without a single assigned column
    #[error("{statement} has no assigned columns")]
    EmptyAssignments { statement: &'static str },

    /// A batch row whose column set differs from the first row
    #[error("batch row {row} has columns [{found}], expected [{expected}]")]
    HeterogeneousBatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// A feature the active dialect does not advertise
    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        feature: &'static str,
        dialect: &'static str,
    },

    /// Structurally invalid statement
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// Store value could not be converted back to the host type
    #[error("Decode error for {sql_type}: {message}")]
    Decode { sql_type: String, message: String },

    /// Unknown dialect name in configuration
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Driver error from the execution layer
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
}

impl QueryError {
    /// Create a decode error for a specific store type
    pub fn decode(sql_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            sql_type: sql_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid statement error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStatement(message.into())
    }

    /// Create an unsupported-capability error
    pub fn unsupported(feature: &'static str, dialect: &'static str) -> Self {
        Self::Unsupported { feature, dialect }
    }

    /// Check if this is a capability mismatch
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Check if this is a structural misuse of a builder
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::EmptyAssignments { .. } | Self::HeterogeneousBatch { .. } | Self::InvalidStatement(_)
        )
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
