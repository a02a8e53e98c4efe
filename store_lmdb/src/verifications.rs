//! LMDB implementation of `VerificationStore`.
//!
//! One write is: persist the photo file, then commit the record and its
//! index entry in a single LMDB write transaction. If the commit fails the
//! photo file is removed best-effort; a file that survives removal is an
//! orphan, findable by the `photo-` prefix and reclaimed by
//! [`LmdbVerificationStore::sweep_orphans`]. A reader can never observe a
//! record without its committed row.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};
use tracing::{debug, warn};

use geoproof_store::artifact::{artifact_filename, is_safe_artifact_name, random_token, ARTIFACT_PREFIX};
use geoproof_store::{NewVerification, StoreError, StoredVerification, VerificationStore};
use geoproof_types::{PhotoRef, TimestampMillis, TransactionId, VerificationRecord};

use crate::LmdbError;

const NEXT_ID_KEY: &[u8] = b"next_id";

pub struct LmdbVerificationStore {
    pub(crate) env: Arc<Env>,
    /// `transaction_id -> bincode(VerificationRecord)`.
    pub(crate) records_db: Database<Bytes, Bytes>,
    /// `created_at_be ++ id_be -> transaction_id`, for newest-first listing.
    pub(crate) created_index_db: Database<Bytes, Bytes>,
    /// Holds the monotonic row-id counter.
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) uploads_dir: PathBuf,
}

/// Build the index key `created_at_be ++ id_be`.
fn index_key(created_at: TimestampMillis, id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&created_at.as_millis().to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

impl LmdbVerificationStore {
    fn next_id(&self, wtxn: &mut heed::RwTxn<'_>) -> Result<u64, LmdbError> {
        let current = match self.meta_db.get(wtxn, NEXT_ID_KEY)? {
            Some(bytes) if bytes.len() == 8 => {
                let arr: [u8; 8] = bytes.try_into().expect("checked length");
                u64::from_le_bytes(arr)
            }
            Some(_) => {
                return Err(LmdbError::Serialization(
                    "next_id has unexpected byte length".to_string(),
                ))
            }
            None => 0,
        };
        let id = current + 1;
        self.meta_db.put(wtxn, NEXT_ID_KEY, &id.to_le_bytes())?;
        Ok(id)
    }

    fn remove_artifact(&self, filename: &str) {
        let path = self.uploads_dir.join(filename);
        if let Err(e) = fs::remove_file(&path) {
            warn!("failed to remove photo artifact {}: {e}", path.display());
        }
    }

    /// Delete photo files that no committed record references. Returns the
    /// number of files removed. Only files matching the generated `photo-`
    /// naming pattern are touched.
    pub fn sweep_orphans(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut referenced = HashSet::new();
        let iter = self.records_db.iter(&rtxn).map_err(LmdbError::from)?;
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let record: VerificationRecord =
                bincode::deserialize(val).map_err(LmdbError::from)?;
            if let Some(name) = record.photo.filename() {
                referenced.insert(name.to_string());
            }
        }
        drop(rtxn);

        let mut removed = 0u64;
        for entry in fs::read_dir(&self.uploads_dir).map_err(LmdbError::from)? {
            let entry = entry.map_err(LmdbError::from)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(ARTIFACT_PREFIX) && !referenced.contains(&name) {
                fs::remove_file(entry.path()).map_err(LmdbError::from)?;
                debug!("swept orphaned artifact {name}");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl VerificationStore for LmdbVerificationStore {
    fn write(&self, new: NewVerification) -> Result<StoredVerification, StoreError> {
        // Photo first: the unique filename means concurrent writers never
        // contend, and a crash before commit only leaves a sweepable orphan.
        let filename = artifact_filename(&random_token(9), &new.photo_extension);
        let path = self.uploads_dir.join(&filename);
        fs::write(&path, &new.photo_bytes).map_err(LmdbError::from)?;

        match self.commit_record(&new, &filename) {
            Ok(stored) => Ok(stored),
            Err(e) => {
                self.remove_artifact(&filename);
                Err(e)
            }
        }
    }

    fn read_one(&self, transaction_id: &TransactionId) -> Result<VerificationRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .records_db
            .get(&rtxn, transaction_id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(transaction_id.to_string()))?;
        let record: VerificationRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn read_all(&self, limit: usize) -> Result<Vec<VerificationRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .created_index_db
            .rev_iter(&rtxn)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            if results.len() >= limit {
                break;
            }
            let (_key, txn_id) = entry.map_err(LmdbError::from)?;
            let val = self
                .records_db
                .get(&rtxn, txn_id)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Backend("index entry without record".to_string())
                })?;
            let record: VerificationRecord =
                bincode::deserialize(val).map_err(LmdbError::from)?;
            results.push(record);
        }
        Ok(results)
    }

    fn update_status(
        &self,
        transaction_id: &TransactionId,
        status: &str,
    ) -> Result<u64, StoreError> {
        let key = transaction_id.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let Some(val) = self.records_db.get(&wtxn, key).map_err(LmdbError::from)? else {
            return Ok(0);
        };
        let mut record: VerificationRecord =
            bincode::deserialize(val).map_err(LmdbError::from)?;
        record.status = status.to_string();
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.records_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(1)
    }

    fn read_photo(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        if !is_safe_artifact_name(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let path = self.uploads_dir.join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(LmdbError::from(e).into()),
        }
    }
}

impl LmdbVerificationStore {
    fn commit_record(
        &self,
        new: &NewVerification,
        filename: &str,
    ) -> Result<StoredVerification, StoreError> {
        let key = new.transaction_id.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self.records_db.get(&wtxn, key).map_err(LmdbError::from)?.is_some() {
            return Err(StoreError::Duplicate(new.transaction_id.to_string()));
        }

        let id = self.next_id(&mut wtxn)?;
        let created_at = TimestampMillis::now();
        let photo = PhotoRef::File {
            filename: filename.to_string(),
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
            amount: new.amount.clone(),
            recipient_name: new.recipient_name.clone(),
            recipient_upi: new.recipient_upi.clone(),
            note: new.note.clone(),
            status: new.status.as_str().to_string(),
            created_at,
        };

        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.records_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        self.created_index_db
            .put(&mut wtxn, &index_key(created_at, id), key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        debug!(id, txn = %new.transaction_id, %filename, "stored verification");
        Ok(StoredVerification {
            id,
            transaction_id: new.transaction_id.clone(),
            photo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use geoproof_types::VerificationStatus;

    fn open_test_store() -> (tempfile::TempDir, LmdbVerificationStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(
            &dir.path().join("db"),
            &dir.path().join("uploads"),
            1 << 24,
        )
        .expect("open env");
        let store = env.verification_store();
        (dir, store)
    }

    fn submission(txn: &str, ts: u64) -> NewVerification {
        NewVerification {
            transaction_id: TransactionId::new(txn),
            latitude: 12.9716,
            longitude: 77.5946,
            accuracy: None,
            photo_bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            photo_extension: "jpg".into(),
            timestamp: TimestampMillis::new(ts),
            amount: "0".into(),
            recipient_name: String::new(),
            recipient_upi: String::new(),
            note: String::new(),
            status: VerificationStatus::Verified,
        }
    }

    fn uploads_file_count(store: &LmdbVerificationStore) -> usize {
        fs::read_dir(&store.uploads_dir).unwrap().count()
    }

    #[test]
    fn write_read_round_trip_with_file_artifact() {
        let (_dir, store) = open_test_store();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        assert_eq!(stored.id, 1);

        let record = store.read_one(&stored.transaction_id).unwrap();
        assert_eq!(record.latitude, 12.9716);
        assert_eq!(record.longitude, 77.5946);
        assert_eq!(record.photo_size, 4);
        assert_eq!(record.timestamp, TimestampMillis::new(1000));
        assert_eq!(record.status, "verified");

        // Artifact is on disk and retrievable by its stored filename.
        let filename = record.photo.filename().expect("file-backed ref").to_string();
        assert_eq!(store.read_photo(&filename).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn ids_are_monotonic() {
        let (_dir, store) = open_test_store();
        let a = store.write(submission("TXN1AAAAAAAAA", 1)).unwrap();
        let b = store.write(submission("TXN2AAAAAAAAA", 2)).unwrap();
        let c = store.write(submission("TXN3AAAAAAAAA", 3)).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn duplicate_write_is_rejected_and_leaves_no_orphan() {
        let (_dir, store) = open_test_store();
        store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        assert_eq!(uploads_file_count(&store), 1);

        let err = store.write(submission("TXN1AAAAAAAAA", 2000)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // The rejected write's photo file was cleaned up.
        assert_eq!(uploads_file_count(&store), 1);
        // Original record untouched.
        let record = store
            .read_one(&TransactionId::new("TXN1AAAAAAAAA"))
            .unwrap();
        assert_eq!(record.timestamp, TimestampMillis::new(1000));
    }

    #[test]
    fn read_all_is_newest_first_and_limited() {
        let (_dir, store) = open_test_store();
        store.write(submission("TXN1AAAAAAAAA", 1)).unwrap();
        store.write(submission("TXN2AAAAAAAAA", 2)).unwrap();
        store.write(submission("TXN3AAAAAAAAA", 3)).unwrap();

        let all = store.read_all(10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction_id.as_str(), "TXN3AAAAAAAAA");
        assert_eq!(all[1].transaction_id.as_str(), "TXN2AAAAAAAAA");
        assert_eq!(all[2].transaction_id.as_str(), "TXN1AAAAAAAAA");

        let limited = store.read_all(1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].transaction_id.as_str(), "TXN3AAAAAAAAA");
    }

    #[test]
    fn update_status_roundtrip_and_unknown_id() {
        let (_dir, store) = open_test_store();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();

        assert_eq!(store.update_status(&stored.transaction_id, "pending").unwrap(), 1);
        assert_eq!(store.read_one(&stored.transaction_id).unwrap().status, "pending");

        assert_eq!(
            store
                .update_status(&TransactionId::new("TXNNOPE000000"), "pending")
                .unwrap(),
            0
        );
    }

    #[test]
    fn read_photo_rejects_traversal() {
        let (_dir, store) = open_test_store();
        for name in ["../db/data.mdb", "a/b.jpg", "..", ""] {
            assert!(matches!(
                store.read_photo(name),
                Err(StoreError::NotFound(_))
            ));
        }
    }

    #[test]
    fn read_photo_unknown_name_is_not_found() {
        let (_dir, store) = open_test_store();
        assert!(matches!(
            store.read_photo("photo-1-ZZZZZZZZZ.jpg"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn sweep_removes_only_unreferenced_artifacts() {
        let (_dir, store) = open_test_store();
        let stored = store.write(submission("TXN1AAAAAAAAA", 1000)).unwrap();
        let kept = stored.photo.filename().unwrap().to_string();

        // Simulate a crash between photo write and record commit.
        fs::write(store.uploads_dir.join("photo-999-ORPHAN000.jpg"), b"x").unwrap();
        // Non-artifact files are never touched.
        fs::write(store.uploads_dir.join("README"), b"keep me").unwrap();

        assert_eq!(store.sweep_orphans().unwrap(), 1);
        assert!(store.uploads_dir.join(&kept).exists());
        assert!(store.uploads_dir.join("README").exists());
        assert!(!store.uploads_dir.join("photo-999-ORPHAN000.jpg").exists());
    }
}
