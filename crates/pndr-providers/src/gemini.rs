//! Gemini `generateContent` as the insight provider.

use std::fmt;

use pndr_core::insight::{NarrativeRequest, TableToNarrative};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{Error, Result, http_client, send_json};

const PROVIDER: &str = "gemini";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
  pub api_key:      String,
  pub model:        String,
  /// API base; the model path is appended.
  pub endpoint:     String,
  pub timeout_secs: u64,
}

impl Default for GeminiConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      model:        "gemini-2.0-flash".into(),
      endpoint:     "https://generativelanguage.googleapis.com/v1beta".into(),
      timeout_secs: 60,
    }
  }
}

impl fmt::Debug for GeminiConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GeminiConfig")
      .field("api_key", &"<redacted>")
      .field("model", &self.model)
      .field("endpoint", &self.endpoint)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

#[derive(Clone)]
pub struct GeminiNarrator {
  client: Client,
  config: GeminiConfig,
}

impl GeminiNarrator {
  pub fn new(config: GeminiConfig) -> Result<Self> {
    if config.api_key.trim().is_empty() {
      return Err(Error::MissingApiKey(PROVIDER));
    }
    Ok(Self { client: http_client(config.timeout_secs)?, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/models/{}:generateContent",
      self.config.endpoint.trim_end_matches('/'),
      self.config.model
    )
  }
}

fn payload(request: &NarrativeRequest) -> Value {
  json!({
    "system_instruction": { "parts": [{ "text": request.instruction }] },
    "contents": [{ "role": "user", "parts": [{ "text": request.content }] }],
  })
}

/// Concatenated text of the first candidate's parts.
fn parse_narrative(body: &Value) -> Result<String> {
  let Some(parts) = body.pointer("/candidates/0/content/parts").and_then(Value::as_array) else {
    let detail = match body.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
      Some(reason) => format!("prompt blocked: {reason}"),
      None => "missing candidates[0].content.parts".into(),
    };
    return Err(Error::MalformedResponse { provider: PROVIDER, detail });
  };
  Ok(
    parts
      .iter()
      .filter_map(|p| p.get("text").and_then(Value::as_str))
      .collect::<String>(),
  )
}

impl TableToNarrative for GeminiNarrator {
  type Error = Error;

  async fn narrate(&self, request: &NarrativeRequest) -> Result<String> {
    let body = send_json(
      PROVIDER,
      self
        .client
        .post(self.url())
        .header("x-goog-api-key", &self.config.api_key)
        .json(&payload(request)),
    )
    .await?;
    let narrative = parse_narrative(&body)?;
    debug!(
      model = %self.config.model,
      rows = request.row_count,
      chars = narrative.len(),
      "narrative received"
    );
    Ok(narrative)
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, extract::Path, http::HeaderMap, routing::post};

  use super::*;
  use crate::mock_server;

  fn request() -> NarrativeRequest {
    NarrativeRequest {
      instruction: "persona".into(),
      content:     "Analise os seguintes dados []".into(),
      row_count:   0,
    }
  }

  #[test]
  fn persona_is_the_system_instruction() {
    let body = payload(&request());
    assert_eq!(body["system_instruction"]["parts"][0]["text"], "persona");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Analise os seguintes dados []");
  }

  #[test]
  fn parts_are_concatenated() {
    let body = json!({
      "candidates": [{ "content": { "parts": [{ "text": "Primeiro. " }, { "text": "Segundo." }] } }]
    });
    assert_eq!(parse_narrative(&body).unwrap(), "Primeiro. Segundo.");
  }

  #[test]
  fn blocked_prompt_is_reported() {
    let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
    let err = parse_narrative(&body).unwrap_err();
    assert!(err.to_string().contains("prompt blocked: SAFETY"));
  }

  #[tokio::test]
  async fn narrates_against_the_model_path() {
    let router = Router::new().route(
      "/v1beta/models/{call}",
      post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
        assert_eq!(call, "gemini-2.0-flash:generateContent");
        assert_eq!(headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()), Some("g-test"));
        let echoed = body["contents"][0]["parts"][0]["text"].clone();
        Json(json!({ "candidates": [{ "content": { "parts": [{ "text": echoed }] } }] }))
      }),
    );
    let base = mock_server(router).await;
    let narrator = GeminiNarrator::new(GeminiConfig {
      api_key: "g-test".into(),
      endpoint: format!("{base}/v1beta"),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(narrator.narrate(&request()).await.unwrap(), "Analise os seguintes dados []");
  }
}
