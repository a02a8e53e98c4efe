//! Submission ingestion pipeline.
//!
//! Inbound submission → [`validator`] → [`builder`] → store write. The
//! validator is pure; the builder generates transaction ids, applies field
//! defaults, and retries on the (vanishingly rare) duplicate-id collision.

pub mod builder;
pub mod error;
pub mod validator;

pub use builder::{generate_transaction_id, IngestReceipt, Ingestor};
pub use error::IngestError;
pub use validator::{validate, PhotoUpload, Submission, ValidSubmission};
