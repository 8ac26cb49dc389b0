//! Read-only handlers describing what can be asked.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/catalog` | Plain text, the same description the translator sees |
//! | `GET`  | `/indicators` | Optional `?q=<substring>` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pndr_core::{
  Assistant,
  taxonomy::{self, Indicator},
};
use serde::Deserialize;

/// `GET /catalog`
pub async fn describe<A: Assistant>(State(assistant): State<Arc<A>>) -> String {
  assistant.catalog().describe()
}

#[derive(Debug, Deserialize, Default)]
pub struct IndicatorParams {
  /// Case-insensitive substring of the indicator name.
  pub q: Option<String>,
}

/// `GET /indicators[?q=<substring>]`
pub async fn indicators(Query(params): Query<IndicatorParams>) -> Json<Vec<Indicator>> {
  let matches = match params.q.as_deref().map(str::trim) {
    Some(needle) if !needle.is_empty() => taxonomy::search(needle).copied().collect(),
    _ => taxonomy::INDICATORS.to_vec(),
  };
  Json(matches)
}
