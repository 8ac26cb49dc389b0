//! [`SqliteExecutor`]: the read-only implementation of [`QueryExecutor`].

use std::{
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use pndr_core::{
  executor::{ExecutionError, QueryExecutor},
  table::ResultTable,
};
use rusqlite::{Batch, InterruptHandle, OpenFlags};
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::encode::decode_cell;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs translated queries against a SQLite file.
///
/// Holds no connection between calls: every [`execute`](QueryExecutor::execute)
/// opens its own read-only connection and releases it on every exit path,
/// including when the caller drops the future.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
  path:    PathBuf,
  timeout: Duration,
}

impl SqliteExecutor {
  pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
    Self { path: path.as_ref().to_owned(), timeout }
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn timeout(&self) -> Duration { self.timeout }

  /// Open a read-only session. `query_only` additionally refuses writes that
  /// would not touch the file (e.g. to an attached temp schema).
  pub(crate) async fn connect(&self) -> Result<Connection, tokio_rusqlite::Error> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
      | OpenFlags::SQLITE_OPEN_NO_MUTEX
      | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(&self.path, flags).await?;
    conn
      .call(|conn| {
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }

  async fn run(&self, query: &str) -> Result<ResultTable, ExecutionError> {
    let conn = self.connect().await.map_err(classify)?;
    let interrupt = conn
      .call(|conn| Ok(conn.get_interrupt_handle()))
      .await
      .map_err(classify)?;
    // Declared after `conn`, so a dropped future fires it before the
    // connection goes.
    let guard = CancelGuard::new(interrupt);

    let sql = query.to_owned();
    let cancelled = guard.flag();
    let call = conn.call(move |conn| {
      conn.progress_handler(PROGRESS_OPS, Some(move || cancelled.load(Ordering::Relaxed)));
      let table = read_table(conn, &sql);
      conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);
      Ok(table?)
    });

    let outcome = tokio::time::timeout(self.timeout, call).await;
    match outcome {
      Ok(result) => {
        guard.disarm();
        if let Err(e) = conn.close().await {
          debug!(error = %e, "closing read-only connection");
        }
        result.map_err(classify)
      }
      Err(_) => {
        drop(guard);
        drop(conn);
        warn!(timeout_ms = self.timeout.as_millis() as u64, "query interrupted");
        Err(ExecutionError::Timeout(self.timeout))
      }
    }
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Virtual machine steps between cancellation checks.
const PROGRESS_OPS: i32 = 1000;

/// Stops the running statement when dropped, unless disarmed.
///
/// `interrupt()` is lost if it lands before the statement starts, so the
/// flag is also polled from a progress handler on the worker.
struct CancelGuard {
  interrupt: InterruptHandle,
  cancelled: Arc<AtomicBool>,
  armed:     bool,
}

impl CancelGuard {
  fn new(interrupt: InterruptHandle) -> Self {
    Self { interrupt, cancelled: Arc::new(AtomicBool::new(false)), armed: true }
  }

  fn flag(&self) -> Arc<AtomicBool> { Arc::clone(&self.cancelled) }

  fn disarm(mut self) { self.armed = false; }
}

impl Drop for CancelGuard {
  fn drop(&mut self) {
    if self.armed {
      self.cancelled.store(true, Ordering::Relaxed);
      self.interrupt.interrupt();
      debug!("statement cancelled");
    }
  }
}

impl QueryExecutor for SqliteExecutor {
  async fn execute(&self, query: &str) -> Result<ResultTable, ExecutionError> {
    self.run(query).await
  }
}

fn read_table(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<ResultTable> {
  let mut batch = Batch::new(conn, sql);
  let Some(mut stmt) = batch.next()? else {
    return Err(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
      Some("syntax error: empty query".into()),
    ));
  };
  // Trailing statements are prepared to detect them, never run.
  if batch.next()?.is_some() {
    return Err(rusqlite::Error::MultipleStatement);
  }

  let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let width = names.len();

  let mut rows = stmt.query([])?;
  let mut out = Vec::new();
  while let Some(row) = rows.next()? {
    let mut cells = Vec::with_capacity(width);
    for idx in 0..width {
      cells.push(decode_cell(row.get_ref(idx)?));
    }
    out.push(cells);
  }
  Ok(ResultTable::from_rows(names, out))
}

// ─── Error classification ────────────────────────────────────────────────────

const SCHEMA_MARKERS: &[&str] = &["no such table", "no such column", "no such function"];
const SYNTAX_MARKERS: &[&str] = &["syntax error", "incomplete input", "unrecognized token"];

fn classify(err: tokio_rusqlite::Error) -> ExecutionError {
  match err {
    tokio_rusqlite::Error::Rusqlite(e) => classify_sqlite(e),
    other => ExecutionError::Store(other.to_string()),
  }
}

fn classify_sqlite(err: rusqlite::Error) -> ExecutionError {
  if matches!(err, rusqlite::Error::MultipleStatement) {
    return ExecutionError::Syntax("only a single statement may be executed".into());
  }
  let message = err.to_string();
  let lower = message.to_lowercase();
  if SCHEMA_MARKERS.iter().any(|m| lower.contains(m)) {
    ExecutionError::SchemaReference(message)
  } else if SYNTAX_MARKERS.iter().any(|m| lower.contains(m)) {
    ExecutionError::Syntax(message)
  } else {
    ExecutionError::Store(message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(msg: &str) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
      Some(msg.to_owned()),
    )
  }

  #[test]
  fn classifies_engine_messages() {
    assert!(matches!(
      classify_sqlite(failure("no such column: v.populacao")),
      ExecutionError::SchemaReference(_)
    ));
    assert!(matches!(
      classify_sqlite(failure("near \"SELEC\": syntax error")),
      ExecutionError::Syntax(_)
    ));
    assert!(matches!(
      classify_sqlite(rusqlite::Error::MultipleStatement),
      ExecutionError::Syntax(_)
    ));
    assert!(matches!(
      classify_sqlite(failure("attempt to write a readonly database")),
      ExecutionError::Store(_)
    ));
  }
}
