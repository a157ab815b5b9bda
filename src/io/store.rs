use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::category::{Category, CategoryCollection, seed_categories};

/// Error type for snapshot slot access
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt snapshot in slot {slot}: {source}")]
    Corrupt {
        slot: String,
        source: serde_json::Error,
    },
    #[error("could not serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable, named slot holding one full snapshot of the category collection.
///
/// Implementors provide raw slot access; `load` and `save` wrap it with the
/// seed fallback and never return an error.
pub trait SnapshotStore: Send + Sync {
    /// Slot key (used in diagnostics)
    fn slot(&self) -> &str;

    /// Read the slot. `Ok(None)` means nothing has been stored yet.
    fn read_slot(&self) -> Result<Option<CategoryCollection>, StoreError>;

    /// Replace the slot's content with `categories`, all or nothing.
    fn write_slot(&self, categories: &[Category]) -> Result<(), StoreError>;

    /// Called after `read_slot` failed, before falling back to the seed.
    fn on_read_failure(&self, _err: &StoreError) {}

    /// Called after `write_slot` failed.
    fn on_write_failure(&self, _categories: &[Category], _err: &StoreError) {}

    /// Load the stored snapshot, or the seed collection when the slot is
    /// absent, empty, or unreadable.
    fn load(&self) -> CategoryCollection {
        match self.read_slot() {
            Ok(Some(categories)) => {
                log::debug!(
                    "event=snapshot_load module=store status=ok slot={} categories={}",
                    self.slot(),
                    categories.len()
                );
                categories
            }
            Ok(None) => {
                log::info!(
                    "event=snapshot_load module=store status=seeded slot={}",
                    self.slot()
                );
                seed_categories()
            }
            Err(e) => {
                log::warn!(
                    "event=snapshot_load module=store status=fallback slot={} error={}",
                    self.slot(),
                    e
                );
                self.on_read_failure(&e);
                seed_categories()
            }
        }
    }

    /// Overwrite the slot with `categories`. Failures are logged, not returned.
    fn save(&self, categories: &[Category]) {
        match self.write_slot(categories) {
            Ok(()) => log::debug!(
                "event=snapshot_save module=store status=ok slot={} categories={}",
                self.slot(),
                categories.len()
            ),
            Err(e) => {
                log::error!(
                    "event=snapshot_save module=store status=error slot={} error={}",
                    self.slot(),
                    e
                );
                self.on_write_failure(categories, &e);
            }
        }
    }
}

fn parse_snapshot(slot: &str, text: &str) -> Result<Option<CategoryCollection>, StoreError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            slot: slot.to_string(),
            source,
        })
}

// ---------------------------------------------------------------------------
// File-backed slot
// ---------------------------------------------------------------------------

/// A slot stored as `<slot>.json` inside the data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    slot: String,
}

impl FileStore {
    pub fn new(data_dir: &Path, slot: &str) -> Self {
        FileStore {
            data_dir: data_dir.to_path_buf(),
            slot: slot.to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.slot))
    }

    /// Where an unreadable snapshot is copied before the seed takes over.
    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json.bak", self.slot))
    }
}

impl SnapshotStore for FileStore {
    fn slot(&self) -> &str {
        &self.slot
    }

    fn read_slot(&self) -> Result<Option<CategoryCollection>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|source| StoreError::ReadError {
            path: path.clone(),
            source,
        })?;
        parse_snapshot(&self.slot, &text)
    }

    fn write_slot(&self, categories: &[Category]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(categories)?;
        let path = self.path();
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::WriteError {
            path: self.data_dir.clone(),
            source,
        })?;
        recovery::atomic_write(&path, content.as_bytes())
            .map_err(|source| StoreError::WriteError { path, source })
    }

    fn on_read_failure(&self, err: &StoreError) {
        let path = self.path();
        let backup = self.backup_path();
        let (body, backup_field) = match fs::read(&path) {
            Ok(bytes) => {
                // Same bytes already backed up by an earlier load.
                if fs::read(&backup).is_ok_and(|saved| saved == bytes) {
                    log::debug!(
                        "event=snapshot_backup module=store status=skipped path={}",
                        backup.display()
                    );
                    return;
                }
                let field = match fs::write(&backup, &bytes) {
                    Ok(()) => backup.display().to_string(),
                    Err(e) => {
                        log::warn!(
                            "event=snapshot_backup module=store status=error path={} error={}",
                            backup.display(),
                            e
                        );
                        "none".to_string()
                    }
                };
                (String::from_utf8_lossy(&bytes).into_owned(), field)
            }
            Err(e) => {
                log::warn!(
                    "event=snapshot_backup module=store status=error path={} error={}",
                    path.display(),
                    e
                );
                (String::new(), "none".to_string())
            }
        };
        recovery::log_recovery(
            &self.data_dir,
            RecoveryEntry {
                timestamp: Utc::now(),
                category: RecoveryCategory::Load,
                description: "snapshot unreadable, seed loaded".to_string(),
                fields: vec![
                    ("Slot".to_string(), self.slot.clone()),
                    ("Backup".to_string(), backup_field),
                    ("Error".to_string(), err.to_string()),
                ],
                body,
            },
        );
    }

    fn on_write_failure(&self, categories: &[Category], err: &StoreError) {
        let body = serde_json::to_string_pretty(categories).unwrap_or_default();
        recovery::log_recovery(
            &self.data_dir,
            RecoveryEntry {
                timestamp: Utc::now(),
                category: RecoveryCategory::Write,
                description: "snapshot write failed".to_string(),
                fields: vec![
                    ("Slot".to_string(), self.slot.clone()),
                    ("Error".to_string(), err.to_string()),
                ],
                body,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// In-memory slot
// ---------------------------------------------------------------------------

/// A slot kept in memory as serialized JSON. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: String,
    content: Arc<Mutex<Option<String>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new(slot: &str) -> Self {
        MemoryStore {
            slot: slot.to_string(),
            ..Default::default()
        }
    }

    /// Raw slot content, if anything has been stored.
    pub fn raw(&self) -> Option<String> {
        self.content.lock().ok().and_then(|c| c.clone())
    }

    /// Replace the raw slot content (e.g. to simulate corruption).
    pub fn set_raw(&self, text: &str) {
        if let Ok(mut content) = self.content.lock() {
            *content = Some(text.to_string());
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl SnapshotStore for MemoryStore {
    fn slot(&self) -> &str {
        &self.slot
    }

    fn read_slot(&self) -> Result<Option<CategoryCollection>, StoreError> {
        match self.raw() {
            Some(text) => parse_snapshot(&self.slot, &text),
            None => Ok(None),
        }
    }

    fn write_slot(&self, categories: &[Category]) -> Result<(), StoreError> {
        let text = serde_json::to_string(categories)?;
        let mut content = self
            .content
            .lock()
            .map_err(|_| StoreError::Unavailable("memory slot poisoned".to_string()))?;
        *content = Some(text);
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
