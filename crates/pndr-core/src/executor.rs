//! The `QueryExecutor` trait: the narrow interface to the analytical store.
//!
//! Implemented by storage backends (e.g. `pndr-store-sqlite`). The pipeline
//! depends on this abstraction only.

use std::{future::Future, time::Duration};

use thiserror::Error;

use crate::table::ResultTable;

/// Classified failure of a single query execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
  /// Malformed SQL, or more than one statement.
  #[error("syntax error: {0}")]
  Syntax(String),

  /// Unknown table, column or function.
  #[error("unknown schema reference: {0}")]
  SchemaReference(String),

  #[error("timed out after {0:?}")]
  Timeout(Duration),

  /// The store could not be opened or failed for another reason.
  #[error("store error: {0}")]
  Store(String),
}

/// Runs one query string and materialises its result.
///
/// Implementations must acquire their connection inside `execute` and
/// release it before returning, on every exit path. No connection may outlive
/// the call.
pub trait QueryExecutor: Send + Sync {
  fn execute<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<ResultTable, ExecutionError>> + Send + 'a;
}
