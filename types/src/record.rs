//! The persisted verification record.

use serde::{Deserialize, Serialize};

use crate::{PhotoRef, TimestampMillis, TransactionId};

/// One verification submission as persisted by the store.
///
/// Every field except `status` is immutable once written. `status` is a
/// plain string here because the store treats it as opaque; the builder
/// only ever writes values from [`crate::VerificationStatus`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Store-assigned monotonic row id.
    pub id: u64,
    pub transaction_id: TransactionId,
    pub latitude: f64,
    pub longitude: f64,
    /// GPS accuracy radius in meters, if the client reported one.
    pub accuracy: Option<f64>,
    pub photo: PhotoRef,
    /// Size of the photo artifact in bytes.
    pub photo_size: u64,
    /// Capture time: caller-supplied, or server time when absent.
    pub timestamp: TimestampMillis,
    /// Opaque payment-adjacent metadata; never validated against any ledger.
    pub amount: String,
    pub recipient_name: String,
    pub recipient_upi: String,
    pub note: String,
    pub status: String,
    /// Server-assigned insertion time.
    pub created_at: TimestampMillis,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VerificationRecord {
        VerificationRecord {
            id: 1,
            transaction_id: TransactionId::new("TXN1700000000000ABC123XYZ"),
            latitude: 12.9716,
            longitude: 77.5946,
            accuracy: Some(12.5),
            photo: PhotoRef::File {
                filename: "photo-1700000000000-ABC123XYZ.jpg".into(),
            },
            photo_size: 512_000,
            timestamp: TimestampMillis::new(1_700_000_000_000),
            amount: "0".into(),
            recipient_name: String::new(),
            recipient_upi: String::new(),
            note: String::new(),
            status: "verified".into(),
            created_at: TimestampMillis::new(1_700_000_000_123),
        }
    }

    #[test]
    fn json_round_trip() {
        let record = sample();
        let json = serde_json::to_string(&record).expect("serialize");
        let back: VerificationRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }
}
