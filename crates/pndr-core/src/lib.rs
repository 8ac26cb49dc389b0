//! Core types and trait definitions for the PNDR indicator assistant.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The generative models, the analytical store and the boundary dataset are
//! reached through the capability traits defined here; the concrete adapters
//! live in `pndr-store-sqlite` and `pndr-providers`.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod executor;
pub mod insight;
pub mod model;
pub mod pipeline;
pub mod present;
pub mod table;
pub mod taxonomy;
pub mod translate;
pub mod validate;

pub use error::{Error, ErrorKind, Notice, PipelineError, Result, Stage};
pub use pipeline::{Answer, Assistant, Pipeline, PipelineOptions};
