//! Process-wide settings, loaded once at startup.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults;
//! 2. the TOML file (optional);
//! 3. `PNDR__<SECTION>__<KEY>` environment variables, e.g.
//!    `PNDR__STORE__PATH=/data/pndr.sqlite3`.
//!
//! API keys left empty by all three fall back to `OPENAI_API_KEY` and
//! `GEMINI_API_KEY`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use pndr_core::PipelineOptions;
use pndr_providers::{BoundariesConfig, GeminiConfig, OpenAiConfig};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub server:     ServerSettings,
  pub store:      StoreSettings,
  pub openai:     OpenAiConfig,
  pub gemini:     GeminiConfig,
  pub boundaries: BoundariesConfig,
  pub pipeline:   PipelineOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub bind: String,
}

impl Default for ServerSettings {
  fn default() -> Self { Self { bind: "127.0.0.1:8080".into() } }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
  pub path:         PathBuf,
  /// Per-query execution limit.
  pub timeout_secs: u64,
}

impl Default for StoreSettings {
  fn default() -> Self {
    Self {
      path:         PathBuf::from("pndr.sqlite3"),
      timeout_secs: pndr_store_sqlite::DEFAULT_TIMEOUT.as_secs(),
    }
  }
}

impl StoreSettings {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// The store path with a leading `~` expanded.
  pub fn resolved_path(&self) -> PathBuf { expand_tilde(&self.path) }
}

impl Settings {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PNDR")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;
    let mut settings: Settings = raw.try_deserialize()?;
    settings.fill_keys(|name| std::env::var(name).ok());
    Ok(settings)
  }

  fn fill_keys(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if self.openai.api_key.is_empty()
      && let Some(key) = lookup("OPENAI_API_KEY")
    {
      self.openai.api_key = key;
    }
    if self.gemini.api_key.is_empty()
      && let Some(key) = lookup("GEMINI_API_KEY")
    {
      self.gemini.api_key = key;
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
