//! Async HTTP client wrapping the PNDR assistant JSON API.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use pndr_core::Answer;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Connection settings for the assistant API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:     String,
  /// Answers wait on two model calls and a query; allow for all three.
  pub timeout_secs: u64,
}

/// One entry of `GET /api/indicators`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndicatorEntry {
  pub group: String,
  pub theme: String,
  pub name:  String,
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `POST /api/ask`
  pub async fn ask(&self, question: &str) -> Result<Answer> {
    let started = Instant::now();
    let resp = self
      .client
      .post(self.url("/ask"))
      .json(&json!({ "question": question }))
      .send()
      .await
      .context("POST /ask failed")?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(anyhow!("POST /ask → {status}: {body}"));
    }
    let answer: Answer = resp.json().await.context("deserialising answer")?;
    debug!(
      request_id = %answer.id,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "answer received"
    );
    Ok(answer)
  }

  /// `GET /api/indicators`
  pub async fn indicators(&self) -> Result<Vec<IndicatorEntry>> {
    let resp = self
      .client
      .get(self.url("/indicators"))
      .send()
      .await
      .context("GET /indicators failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /indicators → {}", resp.status()));
    }
    resp.json().await.context("deserialising indicators")
  }
}
