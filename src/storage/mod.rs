//! Durable persistence of labeled scan records.
//!
//! The pipeline writes every record once, after the in-memory history
//! append. Failures are logged by the caller and never abort a batch.
//! Remote writes go through a bounded background queue so a slow endpoint
//! never holds up a batch.

mod document;
mod encrypted;
mod queue;

pub use document::DocumentStore;
pub use encrypted::SecureStore;
pub use queue::QueuedStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::scan::ScanRecord;
use std::sync::Arc;

/// Records waiting for the remote writer before new ones are rejected.
const REMOTE_QUEUE_CAPACITY: usize = 1024;

pub trait DurableStore: Send + Sync {
    /// Commit one record.
    fn append(&self, record: &ScanRecord) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Accepts and discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl DurableStore for NullStore {
    fn append(&self, _record: &ScanRecord) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Build the configured backend. `secret` keys the SQLite payload cipher.
pub fn open(config: &StoreConfig, secret: &[u8]) -> Result<Arc<dyn DurableStore>, StoreError> {
    let store: Arc<dyn DurableStore> = match config.backend {
        StoreBackend::Sqlite => {
            std::fs::create_dir_all(&config.data_dir)?;
            Arc::new(SecureStore::open(&config.data_dir.join("scans.db"), secret)?)
        }
        StoreBackend::Document => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| StoreError::Remote("document backend needs an endpoint".into()))?;
            Arc::new(QueuedStore::spawn(
                DocumentStore::new(endpoint, &config.collection)?,
                REMOTE_QUEUE_CAPACITY,
            )?)
        }
        StoreBackend::None => Arc::new(NullStore),
    };
    tracing::info!(backend = store.name(), "durable store ready");
    Ok(store)
}
