//! Rosetta HTTP surface.
//!
//! Thin axum layer over the transformation pipeline: each handler drives one
//! pipeline run sequentially and maps domain errors to the Rosetta error
//! object. Request cancellation is future drop - every provider await inside
//! the pipeline doubles as a cancellation checkpoint, and partially built
//! blocks are dropped with the handler future.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, ServerConfig, serve, serve_with_shutdown};
