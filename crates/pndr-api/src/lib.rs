//! JSON API for the PNDR assistant.
//!
//! Exposes an axum [`Router`] backed by any [`pndr_core::Assistant`].
//! Tracing layers, TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pndr_api::api_router(Arc::new(pipeline)))
//! ```

pub mod ask;
pub mod catalog;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use pndr_core::Assistant;

pub use error::ApiError;

/// Build a fully-materialised API router for `assistant`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<A: Assistant>(assistant: Arc<A>) -> Router<()> {
  Router::new()
    .route("/ask", post(ask::handler::<A>))
    .route("/catalog", get(catalog::describe::<A>))
    .route("/indicators", get(catalog::indicators))
    .with_state(assistant)
}
