//! SQLite-backed scan store with AES-GCM encryption of the record payload.
//! Coordinates are location data, so the full record is sealed; only the
//! batch id, label and scan time stay queryable in clear.

use super::DurableStore;
use crate::error::StoreError;
use crate::scan::ScanRecord;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| StoreError::Crypto)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, StoreError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Decode("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    cipher.decrypt(nonce.into(), ct).map_err(|_| StoreError::Crypto)
}

pub struct SecureStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SecureStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id TEXT PRIMARY KEY,
                batch_id TEXT NOT NULL,
                scanned_at INTEGER NOT NULL,
                is_anomaly INTEGER NOT NULL,
                payload_enc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_scans_batch ON scans(batch_id);
            CREATE INDEX IF NOT EXISTS idx_scans_scanned_at ON scans(scanned_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    /// Insert one record; returns its row id.
    pub fn insert(&self, record: &ScanRecord) -> Result<String, StoreError> {
        let payload = serde_json::to_vec(record)?;
        let enc = encrypt(&self.key, &payload)?;
        let id = Uuid::new_v4().to_string();
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .execute(
                "INSERT INTO scans (id, batch_id, scanned_at, is_anomaly, payload_enc) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, record.batch_id, record.scanned_at, record.is_anomaly, enc],
            )?;
        Ok(id)
    }

    /// Every stored record for a batch id, oldest first (decrypted).
    pub fn records_for(&self, batch_id: &str) -> Result<Vec<ScanRecord>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT payload_enc FROM scans WHERE batch_id = ?1 ORDER BY scanned_at, rowid",
        )?;
        let encoded = stmt
            .query_map(params![batch_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        encoded
            .iter()
            .map(|enc| -> Result<ScanRecord, StoreError> {
                let plain = decrypt(&self.key, enc)?;
                Ok(serde_json::from_slice(&plain)?)
            })
            .collect()
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

impl DurableStore for SecureStore {
    fn append(&self, record: &ScanRecord) -> Result<(), StoreError> {
        self.insert(record).map(|_| ())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Timestamp;

    #[test]
    fn payload_is_not_stored_in_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecureStore::open(&dir.path().join("scans.db"), b"k").unwrap();
        let record = ScanRecord {
            batch_id: "LAG001".into(),
            latitude: 6.5244,
            longitude: 3.3792,
            timestamp: Timestamp::Text("t1".into()),
            is_anomaly: true,
            scanned_at: 1,
        };
        store.insert(&record).unwrap();
        let enc: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT payload_enc FROM scans", [], |r| r.get(0))
            .unwrap();
        assert!(!enc.contains("6.5244"));
        assert_eq!(store.records_for("LAG001").unwrap(), vec![record]);
    }

    #[test]
    fn wrong_secret_cannot_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.db");
        let record = ScanRecord {
            batch_id: "KANO01".into(),
            latitude: 12.0,
            longitude: 8.6,
            timestamp: Timestamp::Epoch(1700000000.into()),
            is_anomaly: false,
            scanned_at: 1,
        };
        SecureStore::open(&path, b"right").unwrap().insert(&record).unwrap();
        let other = SecureStore::open(&path, b"wrong").unwrap();
        assert!(matches!(other.records_for("KANO01"), Err(StoreError::Crypto)));
    }
}
