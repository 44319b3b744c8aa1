//! File-backed store for persistent secrets, one JSON record per id.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::types::{SecretPurpose, SecretType};

pub(crate) const MAX_ID_LEN: usize = 64;

/// Ids are stable ASCII names, usable directly as file names.
pub(crate) fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        && !id.starts_with('.')
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SecretRecord {
    pub secret_type: SecretType,
    pub purpose: SecretPurpose,
    pub length: usize,
    pub material: String,
}

#[derive(Debug)]
pub(crate) struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn open(dir: PathBuf) -> std::io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn save(&self, id: &str, record: &SecretRecord) -> Result<(), VaultError> {
        let body = serde_json::to_vec(record).map_err(|_| VaultError::MalformedRecord)?;
        fs::write(self.record_path(id), body)?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Result<SecretRecord, VaultError> {
        let path = self.record_path(id);
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::UnknownId)
            }
            Err(e) => return Err(VaultError::Storage(e)),
        };
        serde_json::from_slice(&body).map_err(|_| VaultError::MalformedRecord)
    }
}
