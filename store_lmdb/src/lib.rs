//! LMDB storage backend for the geoproof service.
//!
//! Implements [`geoproof_store::VerificationStore`] using the `heed` LMDB
//! bindings. Records are bincode-encoded values keyed by transaction id;
//! a secondary index keyed by `(created_at, id)` provides newest-first
//! listing. Photo bytes live as uniquely named files under a managed
//! uploads directory next to the database.

pub mod environment;
pub mod error;
pub mod verifications;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use verifications::LmdbVerificationStore;
