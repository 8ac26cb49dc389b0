//! Wiring for the PNDR assistant server: settings, the concrete pipeline and
//! the HTTP application.

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::Settings;

use std::sync::Arc;

use axum::Router;
use pndr_core::{Assistant, Pipeline, catalog::SchemaCatalog};
use pndr_providers::{GeminiNarrator, IbgeBoundaries, OpenAiTranslator};
use pndr_store_sqlite::SqliteExecutor;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The pipeline as deployed: OpenAI translates, SQLite executes, Gemini
/// narrates and IBGE serves the municipality mesh.
pub type PndrPipeline =
  Pipeline<OpenAiTranslator, SqliteExecutor, GeminiNarrator, IbgeBoundaries>;

// ─── Wiring ──────────────────────────────────────────────────────────────────

pub fn executor(settings: &Settings) -> SqliteExecutor {
  SqliteExecutor::new(settings.store.resolved_path(), settings.store.timeout())
}

/// Build the pipeline from settings. Fails when an API key is missing.
pub fn build_pipeline(settings: &Settings) -> Result<PndrPipeline> {
  Ok(Pipeline::new(
    SchemaCatalog::pndr(),
    OpenAiTranslator::new(settings.openai.clone())?,
    executor(settings),
    GeminiNarrator::new(settings.gemini.clone())?,
    IbgeBoundaries::new(settings.boundaries.clone())?,
    settings.pipeline,
  ))
}

/// Log every difference between the store and the catalog. Returns how many
/// there were; drift is a warning, not a reason to refuse to start.
pub async fn report_drift(executor: &SqliteExecutor, catalog: &SchemaCatalog) -> Result<usize> {
  let drift = executor.schema_drift(catalog).await?;
  for entry in &drift {
    warn!(store = %executor.path().display(), "schema drift: {entry}");
  }
  if drift.is_empty() {
    info!(store = %executor.path().display(), "store matches the schema catalog");
  }
  Ok(drift.len())
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The whole HTTP application: the JSON API under `/api`, traced.
pub fn app<A: Assistant>(assistant: Arc<A>) -> Router {
  Router::new()
    .nest("/api", pndr_api::api_router(assistant))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use pndr_core::Answer;
  use pndr_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  struct Silent {
    catalog: SchemaCatalog,
  }

  impl Assistant for Silent {
    async fn ask(&self, question: &str) -> Answer {
      serde_json::from_value(serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000000",
        "question": question,
        "query": null,
        "table": null,
        "empty": false,
        "narrative": null,
        "chart": null,
        "map": null,
        "notices": [],
      }))
      .unwrap()
    }

    fn catalog(&self) -> &SchemaCatalog { &self.catalog }
  }

  fn silent() -> Arc<Silent> { Arc::new(Silent { catalog: SchemaCatalog::pndr() }) }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let req = Request::builder().uri("/api/indicators").body(Body::empty()).unwrap();
    assert_eq!(app(silent()).oneshot(req).await.unwrap().status(), StatusCode::OK);

    let req = Request::builder().uri("/indicators").body(Body::empty()).unwrap();
    assert_eq!(app(silent()).oneshot(req).await.unwrap().status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn pipeline_needs_both_keys() {
    let mut settings = Settings::default();
    settings.openai.api_key = "sk-test".into();
    assert!(matches!(
      build_pipeline(&settings),
      Err(Error::Provider(pndr_providers::Error::MissingApiKey("gemini")))
    ));

    settings.gemini.api_key = "g-test".into();
    assert!(build_pipeline(&settings).is_ok());
  }

  #[tokio::test]
  async fn fresh_store_has_no_drift() {
    let path: PathBuf =
      std::env::temp_dir().join(format!("pndr-server-drift-{}.sqlite3", std::process::id()));
    let catalog = SchemaCatalog::pndr();
    SqliteStore::open(&path, &catalog).await.unwrap().close().await.unwrap();

    let mut settings = Settings::default();
    settings.store.path = path.clone();
    let count = report_drift(&executor(&settings), &catalog).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(count, 0);
  }
}
