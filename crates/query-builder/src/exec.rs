//! The asynchronous execution seam between query construction and a backend.

use crate::ast::select::Select;
use async_trait::async_trait;
use model::records::row::RowData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The backend reported a failure while executing the query.
    #[error("database error: {0}")]
    Database(String),

    /// The query uses a construct this executor cannot run.
    #[error("unsupported query shape: {0}")]
    Unsupported(String),
}

/// Executes a `Select` against a backend, returning rows in the order the
/// query declared.
///
/// Connection management, retries, timeouts and cancellation all belong to
/// the implementation (or its caller), never to consumers of this trait.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch(&self, query: &Select) -> Result<Vec<RowData>, ExecError>;
}
