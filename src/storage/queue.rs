//! Background writer: `append` enqueues and returns, a worker thread drains
//! the queue into the wrapped store. A full queue rejects the record instead
//! of blocking the caller.

use super::DurableStore;
use crate::error::StoreError;
use crate::scan::ScanRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use tracing::warn;

pub struct QueuedStore {
    tx: SyncSender<ScanRecord>,
    name: &'static str,
    failures: Arc<AtomicU64>,
}

impl QueuedStore {
    /// Start a worker that writes into `inner`; at most `capacity` records wait.
    pub fn spawn<S: DurableStore + 'static>(inner: S, capacity: usize) -> Result<Self, StoreError> {
        let (tx, rx) = mpsc::sync_channel::<ScanRecord>(capacity);
        let name = inner.name();
        let failures = Arc::new(AtomicU64::new(0));
        let worker_failures = Arc::clone(&failures);

        thread::Builder::new()
            .name(format!("{name}-writer"))
            .spawn(move || {
                // Ends once every sender is dropped and the queue is drained.
                for record in rx {
                    if let Err(e) = inner.append(&record) {
                        worker_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(store = name, batch_id = %record.batch_id, error = %e, "queued write failed");
                    }
                }
            })?;

        Ok(Self { tx, name, failures })
    }

    /// Writes that failed in the worker since startup.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl DurableStore for QueuedStore {
    fn append(&self, record: &ScanRecord) -> Result<(), StoreError> {
        match self.tx.try_send(record.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(StoreError::Remote(format!("{} write queue full", self.name))),
            Err(TrySendError::Disconnected(_)) => {
                Err(StoreError::Remote(format!("{} writer stopped", self.name)))
            }
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
