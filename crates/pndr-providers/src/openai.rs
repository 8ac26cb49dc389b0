//! OpenAI chat completions as the query translation provider.

use std::fmt;

use pndr_core::translate::{TextToQuery, TranslationRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{Error, Result, http_client, send_json};

const PROVIDER: &str = "openai";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
  pub api_key:      String,
  pub model:        String,
  /// Full chat-completions URL.
  pub endpoint:     String,
  pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      model:        "gpt-4o-mini".into(),
      endpoint:     "https://api.openai.com/v1/chat/completions".into(),
      timeout_secs: 60,
    }
  }
}

impl fmt::Debug for OpenAiConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OpenAiConfig")
      .field("api_key", &"<redacted>")
      .field("model", &self.model)
      .field("endpoint", &self.endpoint)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

/// Sends the whole grounding prompt as a single system message and reads
/// the query from the first choice.
#[derive(Clone)]
pub struct OpenAiTranslator {
  client: Client,
  config: OpenAiConfig,
}

impl OpenAiTranslator {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    if config.api_key.trim().is_empty() {
      return Err(Error::MissingApiKey(PROVIDER));
    }
    Ok(Self { client: http_client(config.timeout_secs)?, config })
  }

  fn payload(&self, prompt: &str) -> Value {
    json!({
      "model": self.config.model,
      "messages": [{ "role": "system", "content": prompt }],
    })
  }
}

fn parse_completion(body: &Value) -> Result<String> {
  body
    .pointer("/choices/0/message/content")
    .and_then(Value::as_str)
    .map(|s| s.trim().to_owned())
    .ok_or_else(|| Error::MalformedResponse {
      provider: PROVIDER,
      detail:   "missing choices[0].message.content".into(),
    })
}

impl TextToQuery for OpenAiTranslator {
  type Error = Error;

  async fn complete(&self, request: &TranslationRequest) -> Result<String> {
    let body = send_json(
      PROVIDER,
      self
        .client
        .post(&self.config.endpoint)
        .bearer_auth(&self.config.api_key)
        .json(&self.payload(&request.prompt)),
    )
    .await?;
    let completion = parse_completion(&body)?;
    debug!(model = %self.config.model, chars = completion.len(), "completion received");
    Ok(completion)
  }
}
