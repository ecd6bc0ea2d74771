//! Compiler façade: a dialect plus configuration, with statement logging.
//!
//! Builders render without side effects; this is the one place that emits
//! `tracing` events (target `querykit.sql`).

use crate::config::CompileConfig;
use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::exec::Executor;
use crate::prepared::PreparedSql;
use crate::qb::{BatchInsertBuilder, Statement, StatementKind};
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Result of executing a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of statements sent.
    pub statements: usize,
    /// Input rows inserted by each statement, in execution order.
    pub rows: Vec<Range<usize>>,
    /// Affected rows per statement, in execution order.
    pub rows_affected: Vec<u64>,
}

impl BatchOutcome {
    /// Total affected rows across all statements.
    pub fn total(&self) -> u64 {
        self.rows_affected.iter().sum()
    }

    /// Input rows and affected count of each statement.
    pub fn spans(&self) -> impl Iterator<Item = (Range<usize>, u64)> + '_ {
        self.rows.iter().cloned().zip(self.rows_affected.iter().copied())
    }
}

/// Compiles builders for one dialect.
#[derive(Debug)]
pub struct Compiler {
    dialect: Box<dyn Dialect>,
    config: CompileConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileConfig::default())
    }
}

impl Compiler {
    /// Create a compiler for the configured built-in dialect.
    pub fn new(config: CompileConfig) -> Self {
        Self {
            dialect: config.dialect.dialect(),
            config,
        }
    }

    /// Create a compiler for a custom dialect. `config.dialect` is ignored.
    pub fn with_dialect(dialect: Box<dyn Dialect>, config: CompileConfig) -> Self {
        Self { dialect, config }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Effective parameter limit: the configured cap, else the dialect's.
    pub fn max_params(&self) -> Option<usize> {
        self.config.max_params.or_else(|| self.dialect.max_params())
    }

    /// Validate and render one statement.
    pub fn compile<S: Statement + ?Sized>(&self, statement: &S) -> QueryResult<PreparedSql> {
        match statement.build(self.dialect()) {
            Ok(prepared) => {
                self.log(statement.kind(), &prepared);
                Ok(prepared)
            }
            Err(err) => {
                warn!(
                    target: "querykit.sql",
                    statement = %statement.kind(),
                    dialect = self.dialect.name(),
                    error = %err,
                    "statement rejected"
                );
                Err(err)
            }
        }
    }

    /// Validate and render a batch insert with the configured strategy.
    ///
    /// Zero rows yield zero statements.
    pub fn compile_batch(&self, batch: &BatchInsertBuilder) -> QueryResult<Vec<PreparedSql>> {
        Ok(self
            .compile_batch_spans(batch)?
            .into_iter()
            .map(|(_, prepared)| prepared)
            .collect())
    }

    /// Like [`compile_batch`](Self::compile_batch), pairing each statement
    /// with the range of input rows it inserts.
    pub fn compile_batch_spans(
        &self,
        batch: &BatchInsertBuilder,
    ) -> QueryResult<Vec<(Range<usize>, PreparedSql)>> {
        let statements = batch
            .build_spans(self.dialect(), self.config.batch_strategy, self.max_params())
            .inspect_err(|err| {
                warn!(
                    target: "querykit.sql",
                    statement = %StatementKind::Insert,
                    dialect = self.dialect.name(),
                    error = %err,
                    "batch rejected"
                );
            })?;

        trace!(
            target: "querykit.sql",
            rows = batch.len(),
            statements = statements.len(),
            strategy = ?self.config.batch_strategy,
            max_params = ?self.max_params(),
            "batch split"
        );
        for (_, prepared) in &statements {
            self.log(StatementKind::Insert, prepared);
        }
        Ok(statements)
    }

    /// Compile and execute one statement.
    pub async fn execute<E, S>(&self, executor: &E, statement: &S) -> QueryResult<u64>
    where
        E: Executor,
        S: Statement + ?Sized,
    {
        let prepared = self.compile(statement)?;
        executor.execute(&prepared).await
    }

    /// Compile and execute a batch insert, statement by statement.
    ///
    /// Stops at the first failing statement.
    pub async fn execute_batch<E: Executor>(
        &self,
        executor: &E,
        batch: &BatchInsertBuilder,
    ) -> QueryResult<BatchOutcome> {
        let statements = self.compile_batch_spans(batch)?;
        let mut outcome = BatchOutcome {
            statements: statements.len(),
            rows: Vec::with_capacity(statements.len()),
            rows_affected: Vec::with_capacity(statements.len()),
        };
        for (span, prepared) in &statements {
            outcome.rows_affected.push(executor.execute(prepared).await?);
            outcome.rows.push(span.clone());
        }
        Ok(outcome)
    }

    fn log(&self, kind: StatementKind, prepared: &PreparedSql) {
        if !self.config.log_sql {
            return;
        }
        debug!(
            target: "querykit.sql",
            statement = %kind,
            dialect = self.dialect.name(),
            param_count = prepared.params.len(),
            sql = %truncate_sql(&prepared.sql, self.config.max_logged_sql_length),
            "compiled"
        );
    }
}

fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}
