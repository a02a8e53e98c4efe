//! Abstract storage for verification records.
//!
//! Every storage backend (LMDB with file-backed photos, in-memory with
//! inline photo blobs) implements [`VerificationStore`]. The rest of the
//! codebase depends only on the trait.

pub mod artifact;
pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use geoproof_types::{PhotoRef, TimestampMillis, TransactionId, VerificationRecord, VerificationStatus};

/// Default number of records returned by [`VerificationStore::read_all`]
/// when the caller does not specify a limit.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Maximum allowed list limit.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Resolve an optional caller-supplied limit, clamped to [1, MAX_LIST_LIMIT].
pub fn effective_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// A validated, fully defaulted submission ready to be persisted.
///
/// Produced by the record builder; the store assigns `id` and `created_at`
/// and decides how the photo bytes are persisted.
#[derive(Clone, Debug)]
pub struct NewVerification {
    pub transaction_id: TransactionId,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// Raw photo bytes; always non-empty (enforced by validation).
    pub photo_bytes: Vec<u8>,
    /// Sanitized lowercase extension ("jpg", "jpeg", "png").
    pub photo_extension: String,
    pub timestamp: TimestampMillis,
    pub amount: String,
    pub recipient_name: String,
    pub recipient_upi: String,
    pub note: String,
    pub status: VerificationStatus,
}

/// What the store reports back after a successful write.
#[derive(Clone, Debug)]
pub struct StoredVerification {
    /// Store-assigned monotonic row id.
    pub id: u64,
    pub transaction_id: TransactionId,
    /// How the photo was persisted (file-backed stores expose the filename).
    pub photo: PhotoRef,
}

/// Trait for persisting and querying verification records.
///
/// `write` persists the photo artifact and the structured record as one
/// logically atomic unit: a failed write never leaves a record that
/// `read_one` could observe partially. Conflicting writes to the same
/// transaction id are serialized by the backend; unrelated ids are
/// independent.
pub trait VerificationStore: Send + Sync {
    /// Persist a new record. Fails with [`StoreError::Duplicate`] if the
    /// transaction id already exists.
    fn write(&self, new: NewVerification) -> Result<StoredVerification, StoreError>;

    /// Fetch one record by transaction id.
    fn read_one(&self, transaction_id: &TransactionId) -> Result<VerificationRecord, StoreError>;

    /// Fetch up to `limit` records, newest `created_at` first.
    fn read_all(&self, limit: usize) -> Result<Vec<VerificationRecord>, StoreError>;

    /// Set the status of a record. Returns the number of records affected:
    /// 0 if the transaction id is unknown, 1 otherwise. Status is opaque at
    /// this layer.
    fn update_status(&self, transaction_id: &TransactionId, status: &str)
        -> Result<u64, StoreError>;

    /// Fetch the raw photo bytes for a stored artifact name.
    fn read_photo(&self, name: &str) -> Result<Vec<u8>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_limit_defaults_to_100() {
        assert_eq!(effective_limit(None), 100);
    }

    #[test]
    fn effective_limit_clamps() {
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(5000)), 1000);
        assert_eq!(effective_limit(Some(25)), 25);
    }
}
