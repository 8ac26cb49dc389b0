//! Startup errors for the server library. Request-time failures never reach
//! this type; they are notices on the answer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("provider error: {0}")]
  Provider(#[from] pndr_providers::Error),

  #[error("store error: {0}")]
  Store(#[from] pndr_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
