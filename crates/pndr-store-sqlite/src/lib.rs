//! SQLite backend for the PNDR indicator store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteExecutor`] is the read-only
//! query path used by the pipeline; [`SqliteStore`] is the writable handle
//! used to create the schema and load data.

mod encode;
mod executor;
mod schema;
mod store;

pub mod drift;
pub mod error;

pub use drift::SchemaDrift;
pub use error::{Error, Result};
pub use executor::{DEFAULT_TIMEOUT, SqliteExecutor};
pub use store::{Dump, ImportSummary, SqliteStore};
