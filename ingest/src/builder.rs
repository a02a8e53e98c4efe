//! Record building: transaction-id generation, defaults, duplicate retry.

use std::sync::Arc;

use tracing::{info, warn};

use geoproof_store::artifact::random_token;
use geoproof_store::{NewVerification, StoreError, VerificationStore};
use geoproof_types::{PhotoRef, TimestampMillis, TransactionId, VerificationStatus};

use crate::validator::ValidSubmission;
use crate::IngestError;

/// Length of the random base-36 token in generated transaction ids.
pub const TXN_TOKEN_LEN: usize = 9;

/// How many times a write is retried with a fresh id when the store reports
/// a duplicate. The store's unique-key constraint is the authoritative
/// backstop; generation collisions are negligible but not impossible.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Generate a fresh transaction id: `TXN` + epoch millis + 9 random
/// base-36 characters, uppercased.
pub fn generate_transaction_id() -> TransactionId {
    TransactionId::new(format!(
        "{}{}{}",
        TransactionId::PREFIX,
        TimestampMillis::now().as_millis(),
        random_token(TXN_TOKEN_LEN)
    ))
}

/// What the pipeline reports back after a committed submission. Carries the
/// normalized fields the HTTP layer echoes in its success response.
#[derive(Clone, Debug)]
pub struct IngestReceipt {
    pub id: u64,
    pub transaction_id: TransactionId,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub photo: PhotoRef,
    pub photo_size: u64,
    pub amount: String,
    pub timestamp: TimestampMillis,
}

/// The ingestion pipeline: validated submission in, committed record out.
pub struct Ingestor {
    store: Arc<dyn VerificationStore>,
    default_status: VerificationStatus,
}

impl Ingestor {
    /// Pipeline for the fully validated entry path (records are written as
    /// `verified`).
    pub fn new(store: Arc<dyn VerificationStore>) -> Self {
        Self::with_default_status(store, VerificationStatus::Verified)
    }

    /// Pipeline writing records with the given status; the simplified
    /// inline-storage path uses `Pending`.
    pub fn with_default_status(
        store: Arc<dyn VerificationStore>,
        default_status: VerificationStatus,
    ) -> Self {
        Self {
            store,
            default_status,
        }
    }

    /// Persist a validated submission, retrying with a fresh transaction id
    /// if the store reports a duplicate.
    pub fn commit(&self, valid: ValidSubmission) -> Result<IngestReceipt, IngestError> {
        let photo_size = valid.photo_bytes.len() as u64;
        let timestamp = valid.timestamp.unwrap_or_else(TimestampMillis::now);

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let transaction_id = generate_transaction_id();
            let new = NewVerification {
                transaction_id: transaction_id.clone(),
                latitude: valid.latitude,
                longitude: valid.longitude,
                accuracy: valid.accuracy,
                photo_bytes: valid.photo_bytes.clone(),
                photo_extension: valid.photo_extension.clone(),
                timestamp,
                amount: valid.amount.clone().unwrap_or_else(|| "0".to_string()),
                recipient_name: valid.recipient_name.clone().unwrap_or_default(),
                recipient_upi: valid.recipient_upi.clone().unwrap_or_default(),
                note: valid.note.clone().unwrap_or_default(),
                status: self.default_status,
            };

            match self.store.write(new) {
                Ok(stored) => {
                    info!(
                        txn = %stored.transaction_id,
                        lat = valid.latitude,
                        lon = valid.longitude,
                        photo_size,
                        "verification saved"
                    );
                    return Ok(IngestReceipt {
                        id: stored.id,
                        transaction_id: stored.transaction_id,
                        latitude: valid.latitude,
                        longitude: valid.longitude,
                        accuracy: valid.accuracy,
                        photo: stored.photo,
                        photo_size,
                        amount: valid.amount.clone().unwrap_or_else(|| "0".to_string()),
                        timestamp,
                    });
                }
                Err(StoreError::Duplicate(id)) => {
                    warn!(%id, attempt, "transaction id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(IngestError::IdRetriesExhausted)
    }
}
