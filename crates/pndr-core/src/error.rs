//! Error types for `pndr-core`.
//!
//! [`Error`] covers the crate's own fallible helpers. [`PipelineError`] is the
//! request-scoped failure taxonomy: every variant is recoverable and ends up
//! as a [`Notice`] on the [`Answer`](crate::pipeline::Answer) instead of
//! aborting the request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{executor::ExecutionError, validate::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("invalid boundary collection: {0}")]
  InvalidBoundaries(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Pipeline failures ───────────────────────────────────────────────────────

/// A failure scoped to a single question/answer cycle.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
  #[error("translation provider unavailable: {0}")]
  TranslationUnavailable(String),

  #[error("query syntax error: {message}")]
  QuerySyntax { query: String, message: String },

  #[error("query references unknown tables or columns: {message}")]
  SchemaReference { query: String, message: String },

  #[error("query rejected: {reason}")]
  QueryRejected { query: String, reason: String },

  #[error("query timed out after {}ms", .after.as_millis())]
  ExecutionTimeout { query: String, after: Duration },

  #[error("store error: {message}")]
  Store { query: String, message: String },

  #[error("insight provider unavailable: {0}")]
  InsightUnavailable(String),

  #[error("boundary source unavailable: {0}")]
  BoundariesUnavailable(String),
}

impl PipelineError {
  /// Attach the offending query text to an executor failure.
  pub fn from_execution(query: &str, err: ExecutionError) -> Self {
    let query = query.to_owned();
    match err {
      ExecutionError::Syntax(message) => Self::QuerySyntax { query, message },
      ExecutionError::SchemaReference(message) => {
        Self::SchemaReference { query, message }
      }
      ExecutionError::Timeout(after) => Self::ExecutionTimeout { query, after },
      ExecutionError::Store(message) => Self::Store { query, message },
    }
  }

  /// Attach the offending query text to a validator rejection.
  pub fn from_validation(query: &str, err: ValidationError) -> Self {
    let query = query.to_owned();
    match err {
      ValidationError::Syntax(message) => Self::QuerySyntax { query, message },
      ValidationError::SchemaReference(message) => {
        Self::SchemaReference { query, message }
      }
      ValidationError::Rejected(reason) => Self::QueryRejected { query, reason },
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::TranslationUnavailable(_) => ErrorKind::TranslationUnavailable,
      Self::QuerySyntax { .. } => ErrorKind::QuerySyntaxError,
      Self::SchemaReference { .. } => ErrorKind::SchemaReferenceError,
      Self::QueryRejected { .. } => ErrorKind::QueryRejected,
      Self::ExecutionTimeout { .. } => ErrorKind::ExecutionTimeout,
      Self::Store { .. } => ErrorKind::StoreError,
      Self::InsightUnavailable(_) => ErrorKind::InsightUnavailable,
      Self::BoundariesUnavailable(_) => ErrorKind::BoundariesUnavailable,
    }
  }

  /// The query text that caused the failure, for diagnosis.
  pub fn query(&self) -> Option<&str> {
    match self {
      Self::QuerySyntax { query, .. }
      | Self::SchemaReference { query, .. }
      | Self::QueryRejected { query, .. }
      | Self::ExecutionTimeout { query, .. }
      | Self::Store { query, .. } => Some(query),
      Self::TranslationUnavailable(_)
      | Self::InsightUnavailable(_)
      | Self::BoundariesUnavailable(_) => None,
    }
  }
}

/// Stable, serialisable discriminant of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  TranslationUnavailable,
  QuerySyntaxError,
  SchemaReferenceError,
  QueryRejected,
  ExecutionTimeout,
  StoreError,
  InsightUnavailable,
  BoundariesUnavailable,
}

// ─── Notices ─────────────────────────────────────────────────────────────────

/// The pipeline step a notice originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Translation,
  Validation,
  Execution,
  Insight,
  Map,
}

/// A visible, non-blocking report of a stage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
  pub stage:   Stage,
  pub kind:    ErrorKind,
  pub message: String,
  /// The offending query, when the failure was caused by one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub query:   Option<String>,
}

impl Notice {
  pub fn new(stage: Stage, err: &PipelineError) -> Self {
    Self {
      stage,
      kind: err.kind(),
      message: err.to_string(),
      query: err.query().map(str::to_owned),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn execution_errors_keep_the_query() {
    let err = PipelineError::from_execution(
      "SELECT nope FROM valoresmeta",
      ExecutionError::SchemaReference("no such column: nope".into()),
    );
    assert_eq!(err.kind(), ErrorKind::SchemaReferenceError);
    assert_eq!(err.query(), Some("SELECT nope FROM valoresmeta"));

    let notice = Notice::new(Stage::Execution, &err);
    assert_eq!(notice.query.as_deref(), Some("SELECT nope FROM valoresmeta"));
    assert!(notice.message.contains("no such column"));
  }

  #[test]
  fn provider_errors_carry_no_query() {
    let err = PipelineError::InsightUnavailable("503".into());
    assert!(err.query().is_none());
    let json = serde_json::to_value(Notice::new(Stage::Insight, &err)).unwrap();
    assert_eq!(json["kind"], "insight_unavailable");
    assert_eq!(json["stage"], "insight");
    assert!(json.get("query").is_none());
  }

  #[test]
  fn stages_serialise_snake_case() {
    let err = PipelineError::BoundariesUnavailable("502".into());
    let json = serde_json::to_value(Notice::new(Stage::Map, &err)).unwrap();
    assert_eq!(json["stage"], "map");
    assert!(serde_json::from_value::<Stage>(serde_json::json!("chart")).is_err());
  }

  #[test]
  fn timeout_message_reports_milliseconds() {
    let err = ExecutionError::Timeout(Duration::from_millis(1500));
    let err = PipelineError::from_execution("SELECT 1", err);
    assert_eq!(err.to_string(), "query timed out after 1500ms");
  }
}
