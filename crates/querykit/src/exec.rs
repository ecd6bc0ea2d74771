//! Execution seam between compiled statements and a database driver.

use crate::error::QueryResult;
use crate::prepared::PreparedSql;

/// Anything that can run a [`PreparedSql`] and report affected rows.
///
/// The compiler core never links a driver; enable the `postgres` feature for
/// implementations on `tokio_postgres::Client` and `Transaction`.
pub trait Executor: Send + Sync {
    /// Execute one statement and return the number of affected rows.
    fn execute(
        &self,
        statement: &PreparedSql,
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send;
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Executor;
    use crate::error::{QueryError, QueryResult};
    use crate::prepared::PreparedSql;

    impl Executor for tokio_postgres::Client {
        async fn execute(&self, statement: &PreparedSql) -> QueryResult<u64> {
            let params = statement.params_ref();
            tokio_postgres::Client::execute(self, statement.sql(), &params)
                .await
                .map_err(QueryError::from)
        }
    }

    impl Executor for tokio_postgres::Transaction<'_> {
        async fn execute(&self, statement: &PreparedSql) -> QueryResult<u64> {
            let params = statement.params_ref();
            tokio_postgres::Transaction::execute(self, statement.sql(), &params)
                .await
                .map_err(QueryError::from)
        }
    }
}
