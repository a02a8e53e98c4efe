//! HTTP API for the geoproof service.
//!
//! Provides endpoints for:
//! - Verification submission (multipart: coordinates, photo, metadata)
//! - Record retrieval by transaction id
//! - Listing recent verifications
//! - Serving stored photo artifacts
//! - Health check
//!
//! Plus optional fire-and-forget webhook fan-out on successful ingestion.

pub mod error;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use error::ApiError;
pub use server::{ApiServer, AppState};
pub use webhook::Webhook;
