//! Handler for `POST /ask`.

use std::sync::Arc;

use axum::{Json, extract::State};
use pndr_core::{Answer, Assistant};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AskBody {
  pub question: String,
}

/// `POST /ask` with body `{"question":"..."}`.
///
/// Always 200 once the question is accepted, even when every stage failed;
/// the notices say what went wrong.
pub async fn handler<A: Assistant>(
  State(assistant): State<Arc<A>>,
  Json(body): Json<AskBody>,
) -> Result<Json<Answer>, ApiError> {
  let question = body.question.trim();
  if question.is_empty() {
    debug!("rejected blank question");
    return Err(ApiError::BadRequest("question must not be blank".into()));
  }
  Ok(Json(assistant.ask(question).await))
}
