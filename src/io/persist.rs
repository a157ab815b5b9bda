use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::io::store::SnapshotStore;
use crate::model::category::{Category, CategoryCollection};

/// Receives each committed snapshot after the in-memory value has changed.
///
/// Implementations must not report failure back to the caller: the live
/// snapshot is already updated by the time `persist` runs.
pub trait Persister {
    fn persist(&mut self, categories: &[Category]);

    /// Block until every handed-over snapshot has been written (or dropped).
    fn flush(&mut self) {}
}

/// Writes each snapshot through the store before returning.
pub struct SyncPersister {
    store: Arc<dyn SnapshotStore>,
}

impl SyncPersister {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        SyncPersister { store }
    }
}

impl Persister for SyncPersister {
    fn persist(&mut self, categories: &[Category]) {
        self.store.save(categories);
    }
}

/// Hands snapshots to a writer thread and returns immediately.
///
/// The writer drains its queue before each save, so a burst of changes
/// results in a single write of the newest snapshot.
pub struct BackgroundPersister {
    tx: Option<mpsc::Sender<CategoryCollection>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundPersister {
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, rx) = mpsc::channel::<CategoryCollection>();
        let worker = std::thread::Builder::new()
            .name("snapshot-writer".to_string())
            .spawn(move || {
                while let Ok(mut latest) = rx.recv() {
                    while let Ok(newer) = rx.try_recv() {
                        latest = newer;
                    }
                    store.save(&latest);
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!(
                    "event=writer_spawn module=persist status=error error={}",
                    e
                );
                None
            }
        };

        BackgroundPersister {
            tx: worker.as_ref().map(|_| tx),
            worker,
        }
    }
}

impl Persister for BackgroundPersister {
    fn persist(&mut self, categories: &[Category]) {
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send(categories.to_vec()).is_ok())
            .unwrap_or(false);
        if !sent {
            log::warn!("event=snapshot_enqueue module=persist status=dropped");
        }
    }

    fn flush(&mut self) {
        // Closing the channel lets the writer finish its queue and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("event=writer_join module=persist status=panicked");
        }
    }
}

impl Drop for BackgroundPersister {
    fn drop(&mut self) {
        self.flush();
    }
}
