//! Municipality boundaries from the IBGE mesh service.

use std::{sync::Arc, time::Instant};

use pndr_core::present::{BoundaryIndex, BoundarySource};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;

use crate::{Error, Result, http_client, send_json};

const PROVIDER: &str = "ibge";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundariesConfig {
  pub url:          String,
  pub timeout_secs: u64,
}

impl Default for BoundariesConfig {
  fn default() -> Self {
    Self {
      url:          "https://servicodados.ibge.gov.br/api/v3/malhas/paises/BR\
                     ?formato=application/vnd.geo+json&qualidade=maxima\
                     &intrarregiao=municipio"
        .into(),
      timeout_secs: 120,
    }
  }
}

/// Fetches the national municipality mesh on first use and keeps it for the
/// life of the process. A failed fetch is not cached; the next map request
/// tries again.
pub struct IbgeBoundaries {
  client: Client,
  config: BoundariesConfig,
  cache:  OnceCell<Arc<BoundaryIndex>>,
}

impl IbgeBoundaries {
  pub fn new(config: BoundariesConfig) -> Result<Self> {
    Ok(Self { client: http_client(config.timeout_secs)?, config, cache: OnceCell::new() })
  }

  async fn fetch(&self) -> Result<Arc<BoundaryIndex>> {
    let started = Instant::now();
    let collection = send_json(PROVIDER, self.client.get(&self.config.url)).await?;
    let index = BoundaryIndex::from_geojson(collection)?;
    info!(
      features = index.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "loaded municipality boundaries"
    );
    Ok(Arc::new(index))
  }
}

impl BoundarySource for IbgeBoundaries {
  type Error = Error;

  async fn boundaries(&self) -> Result<Arc<BoundaryIndex>> {
    let index = self.cache.get_or_try_init(|| self.fetch()).await?;
    Ok(Arc::clone(index))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
  use serde_json::{Value, json};

  use super::*;
  use crate::mock_server;

  /// Fails the first `failures` calls, then serves a one-feature mesh.
  async fn mesh_server(failures: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
      .route(
        "/malhas",
        get(move |State(hits): State<Arc<AtomicUsize>>| async move {
          let hit = hits.fetch_add(1, Ordering::SeqCst);
          if hit < failures {
            return Err((StatusCode::BAD_GATEWAY, "upstream down"));
          }
          Ok(Json::<Value>(json!({
            "type": "FeatureCollection",
            "features": [{
              "type": "Feature",
              "properties": { "codarea": "2927408" },
              "geometry": { "type": "Polygon", "coordinates": [] }
            }]
          })))
        }),
      )
      .with_state(Arc::clone(&hits));
    (mock_server(router).await, hits)
  }

  fn source(base: &str) -> IbgeBoundaries {
    IbgeBoundaries::new(BoundariesConfig { url: format!("{base}/malhas"), timeout_secs: 5 })
      .unwrap()
  }

  #[tokio::test]
  async fn mesh_is_fetched_once() {
    let (base, hits) = mesh_server(0).await;
    let source = source(&base);

    let first = source.boundaries().await.unwrap();
    let second = source.boundaries().await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(first.geometry(2927408).is_some());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn failures_are_retried_on_the_next_call() {
    let (base, hits) = mesh_server(1).await;
    let source = source(&base);

    let err = source.boundaries().await.unwrap_err();
    assert!(matches!(err, Error::Status { provider: "ibge", status: 502, .. }));
    assert_eq!(source.boundaries().await.unwrap().len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn default_url_asks_for_municipalities() {
    let url = BoundariesConfig::default().url;
    assert!(url.starts_with("https://servicodados.ibge.gov.br/api/v3/malhas/paises/BR?"));
    assert!(url.ends_with("&intrarregiao=municipio"));
    assert!(!url.contains(' '));
  }
}
