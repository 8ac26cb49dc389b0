//! HTTP adapters for the pipeline's external capabilities.
//!
//! - [`OpenAiTranslator`]: [`TextToQuery`](pndr_core::translate::TextToQuery)
//!   over OpenAI chat completions.
//! - [`GeminiNarrator`]: [`TableToNarrative`](pndr_core::insight::TableToNarrative)
//!   over Gemini `generateContent`.
//! - [`IbgeBoundaries`]: [`BoundarySource`](pndr_core::present::BoundarySource)
//!   over the IBGE mesh API, fetched once per process.
//!
//! None of them retries: one attempt per request.

pub mod error;
pub mod gemini;
pub mod ibge;
pub mod openai;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiNarrator};
pub use ibge::{BoundariesConfig, IbgeBoundaries};
pub use openai::{OpenAiConfig, OpenAiTranslator};

fn http_client(timeout_secs: u64) -> Result<Client> {
  Ok(
    Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()?,
  )
}

/// Send `request` and decode a JSON body, turning non-2xx statuses into
/// [`Error::Status`].
async fn send_json(provider: &'static str, request: RequestBuilder) -> Result<Value> {
  let response = request.send().await?;
  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    return Err(Error::Status { provider, status: status.as_u16(), body });
  }
  Ok(response.json().await?)
}

/// A throwaway HTTP server on the loopback interface.
#[cfg(test)]
pub(crate) async fn mock_server(router: axum::Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{address}")
}
