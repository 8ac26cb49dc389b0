//! Error type for `pndr-providers`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pndr_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{provider} returned {status}: {body}")]
  Status { provider: &'static str, status: u16, body: String },

  #[error("unexpected {provider} response: {detail}")]
  MalformedResponse { provider: &'static str, detail: String },

  #[error("no API key configured for {0}")]
  MissingApiKey(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
