//! LMDB environment setup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::verifications::LmdbVerificationStore;
use crate::LmdbError;

/// Default LMDB map size: 1 GiB. Records are small; photos live on the
/// filesystem, not in the map.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    records_db: Database<Bytes, Bytes>,
    created_index_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
    uploads_dir: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `data_dir`, with photo
    /// artifacts stored under `uploads_dir`. Both directories are created
    /// if absent.
    pub fn open(data_dir: &Path, uploads_dir: &Path, map_size: usize) -> Result<Self, LmdbError> {
        fs::create_dir_all(data_dir)?;
        fs::create_dir_all(uploads_dir)?;

        // Safety: the environment directory is not opened elsewhere in
        // this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(data_dir)?
        };

        let mut wtxn = env.write_txn()?;
        let records_db = env.create_database(&mut wtxn, Some("records"))?;
        let created_index_db = env.create_database(&mut wtxn, Some("created_index"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            records_db,
            created_index_db,
            meta_db,
            uploads_dir: uploads_dir.to_path_buf(),
        })
    }

    /// Get the verification store backed by this environment.
    pub fn verification_store(&self) -> LmdbVerificationStore {
        LmdbVerificationStore {
            env: self.env.clone(),
            records_db: self.records_db,
            created_index_db: self.created_index_db,
            meta_db: self.meta_db,
            uploads_dir: self.uploads_dir.clone(),
        }
    }
}
