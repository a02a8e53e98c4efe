//! In-memory backend with inline photo blobs.
//!
//! Photo bytes are base64-encoded directly into the record instead of being
//! written to disk. This backend serves the simplified deployment path and
//! doubles as the test store. All state lives behind one `RwLock`, so a
//! write is trivially atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use geoproof_types::{PhotoRef, TimestampMillis, TransactionId, VerificationRecord};

use crate::{NewVerification, StoreError, StoredVerification, VerificationStore};

#[derive(Default)]
struct MemoryInner {
    next_id: u64,
    /// Records keyed by transaction id.
    records: HashMap<String, VerificationRecord>,
    /// `(created_at, id) -> transaction id`, for newest-first listing.
    by_created: BTreeMap<(u64, u64), String>,
}

/// In-memory [`VerificationStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerificationStore for MemoryStore {
    fn write(&self, new: NewVerification) -> Result<StoredVerification, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let key = new.transaction_id.as_str().to_string();
        if inner.records.contains_key(&key) {
            return Err(StoreError::Duplicate(key));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let created_at = TimestampMillis::now();
        let photo = PhotoRef::Inline {
            data: BASE64.encode(&new.photo_bytes),
        };

        let record = VerificationRecord {
            id,
            transaction_id: new.transaction_id.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
            accuracy: new.accuracy,
            photo: photo.clone(),
            photo_size: new.photo_bytes.len() as u64,
            timestamp: new.timestamp,
            amount: new.amount,
            recipient_name: new.recipient_name,
            recipient_upi: new.recipient_upi,
            note: new.note,
            status: new.status.as_str().to_string(),
            created_at,
        };

        inner.by_created.insert((created_at.as_millis(), id), key.clone());
        inner.records.insert(key, record);
        tracing::debug!(id, txn = %new.transaction_id, "stored inline verification");

        Ok(StoredVerification {
            id,
            transaction_id: new.transaction_id,
            photo,
        })
    }

    fn read_one(&self, transaction_id: &TransactionId) -> Result<VerificationRecord, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        inner
            .records
            .get(transaction_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(transaction_id.to_string()))
    }

    fn read_all(&self, limit: usize) -> Result<Vec<VerificationRecord>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(inner
            .by_created
            .values()
            .rev()
            .take(limit)
            .filter_map(|key| inner.records.get(key).cloned())
            .collect())
    }

    fn update_status(
        &self,
        transaction_id: &TransactionId,
        status: &str,
    ) -> Result<u64, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match inner.records.get_mut(transaction_id.as_str()) {
            Some(record) => {
                record.status = status.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn read_photo(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        // Inline blobs have no separately addressable artifact.
        Err(StoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoproof_types::VerificationStatus;

    fn submission(txn: &str, ts: u64) -> NewVerification {
        NewVerification {
            transaction_id: TransactionId::new(txn),
            latitude: 12.9716,
            longitude: 77.5946,
            accuracy: Some(10.0),
            photo_bytes: vec![0xFF, 0xD8, 0xFF],
            photo_extension: "jpg".into(),
            timestamp: TimestampMillis::new(ts),
            amount: "0".into(),
            recipient_name: String::new(),
            recipient_upi: String::new(),
            note: String::new(),
            status: VerificationStatus::Pending,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let store = MemoryStore::new();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        assert_eq!(stored.id, 1);

        let record = store.read_one(&stored.transaction_id).unwrap();
        assert_eq!(record.latitude, 12.9716);
        assert_eq!(record.longitude, 77.5946);
        assert_eq!(record.photo_size, 3);
        assert_eq!(record.timestamp, TimestampMillis::new(1000));
        assert_eq!(record.status, "pending");
        assert!(matches!(record.photo, PhotoRef::Inline { .. }));
    }

    #[test]
    fn repeated_reads_are_identical() {
        let store = MemoryStore::new();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        let first = store.read_one(&stored.transaction_id).unwrap();
        let second = store.read_one(&stored.transaction_id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_transaction_id_rejected() {
        let store = MemoryStore::new();
        store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        let err = store.write(submission("TXN1AAAAAAAAA", 2000)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        // The failed write must not shadow the original record.
        let record = store
            .read_one(&TransactionId::new("TXN1AAAAAAAAA"))
            .unwrap();
        assert_eq!(record.timestamp, TimestampMillis::new(1000));
    }

    #[test]
    fn read_all_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        store.write(submission("TXN1AAAAAAAAA", 1)).unwrap();
        store.write(submission("TXN2AAAAAAAAA", 2)).unwrap();
        store.write(submission("TXN3AAAAAAAAA", 3)).unwrap();

        let all = store.read_all(10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction_id.as_str(), "TXN3AAAAAAAAA");
        assert_eq!(all[1].transaction_id.as_str(), "TXN2AAAAAAAAA");
        assert_eq!(all[2].transaction_id.as_str(), "TXN1AAAAAAAAA");

        let limited = store.read_all(2).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].transaction_id.as_str(), "TXN3AAAAAAAAA");
    }

    #[test]
    fn update_status_counts_affected_records() {
        let store = MemoryStore::new();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();

        assert_eq!(
            store.update_status(&stored.transaction_id, "verified").unwrap(),
            1
        );
        assert_eq!(
            store.read_one(&stored.transaction_id).unwrap().status,
            "verified"
        );

        assert_eq!(
            store
                .update_status(&TransactionId::new("TXNUNKNOWN00"), "verified")
                .unwrap(),
            0
        );
    }

    #[test]
    fn update_status_leaves_immutable_fields_alone() {
        let store = MemoryStore::new();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        let before = store.read_one(&stored.transaction_id).unwrap();

        store.update_status(&stored.transaction_id, "verified").unwrap();
        let after = store.read_one(&stored.transaction_id).unwrap();

        assert_eq!(after.transaction_id, before.transaction_id);
        assert_eq!(after.latitude, before.latitude);
        assert_eq!(after.longitude, before.longitude);
        assert_eq!(after.photo, before.photo);
        assert_eq!(after.photo_size, before.photo_size);
        assert_eq!(after.timestamp, before.timestamp);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn read_one_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .read_one(&TransactionId::new("TXNMISSING00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn inline_backend_has_no_addressable_photos() {
        let store = MemoryStore::new();
        store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        assert!(matches!(
            store.read_photo("photo-1-ABC.jpg"),
            Err(StoreError::NotFound(_))
        ));
    }
}
