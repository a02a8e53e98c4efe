//! Fundamental types for the geoproof verification service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: transaction identifiers, timestamps, photo references, status
//! enums, and the persisted verification record itself.

pub mod photo;
pub mod record;
pub mod status;
pub mod time;
pub mod transaction_id;

pub use photo::PhotoRef;
pub use record::VerificationRecord;
pub use status::VerificationStatus;
pub use time::TimestampMillis;
pub use transaction_id::TransactionId;
