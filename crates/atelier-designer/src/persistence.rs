//! Persistence adapter.
//!
//! The editor hands finished documents to a [`DesignStore`] and never cares
//! where they end up. Two stores ship with the crate: a directory of JSON
//! files and an in-memory map for tests and previews.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use atelier_core::{DesignId, PersistenceError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::serialization::DesignDocument;

/// Storage backend for design documents
#[async_trait]
pub trait DesignStore: Send + Sync {
    /// Store `document`.
    ///
    /// With `existing` the stored design is overwritten; without it a new
    /// identifier is assigned.
    async fn save(
        &self,
        document: &DesignDocument,
        existing: Option<&DesignId>,
    ) -> Result<DesignId, PersistenceError>;

    /// Fetch a stored document
    async fn load(&self, id: &DesignId) -> Result<DesignDocument, PersistenceError>;
}

/// On-disk envelope around a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDesign {
    id: DesignId,
    saved_at: DateTime<Utc>,
    document: DesignDocument,
}

/// One pretty-printed JSON file per design inside a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &DesignId) -> Result<PathBuf, PersistenceError> {
        let name = id.as_str();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
        {
            return Err(PersistenceError::Rejected {
                reason: format!("'{}' is not a usable design identifier", name),
            });
        }
        Ok(self.root.join(format!("{}.json", name)))
    }

    /// Identifiers of every stored design, sorted
    pub async fn list(&self) -> Result<Vec<DesignId>, PersistenceError> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(DesignId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl DesignStore for JsonFileStore {
    async fn save(
        &self,
        document: &DesignDocument,
        existing: Option<&DesignId>,
    ) -> Result<DesignId, PersistenceError> {
        let id = existing.cloned().unwrap_or_else(DesignId::generate);
        let path = self.path_for(&id)?;
        let stored = StoredDesign {
            id: id.clone(),
            saved_at: Utc::now(),
            document: document.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        tokio::fs::create_dir_all(&self.root).await?;
        let tmp = path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, json).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }

        info!("Saved design {} to {}", id, path.display());
        Ok(id)
    }

    async fn load(&self, id: &DesignId) -> Result<DesignDocument, PersistenceError> {
        let path = self.path_for(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound { id: id.to_string() })
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredDesign = serde_json::from_slice(&bytes)?;
        debug!("Loaded design {} saved at {}", id, stored.saved_at);
        Ok(stored.document)
    }
}

/// Designs kept in memory; can be switched into a failing mode
#[derive(Debug, Default)]
pub struct InMemoryStore {
    designs: Mutex<HashMap<DesignId, DesignDocument>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.designs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.lock().is_empty()
    }

    pub fn get(&self, id: &DesignId) -> Option<DesignDocument> {
        self.designs.lock().get(id).cloned()
    }
}

#[async_trait]
impl DesignStore for InMemoryStore {
    async fn save(
        &self,
        document: &DesignDocument,
        existing: Option<&DesignId>,
    ) -> Result<DesignId, PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io {
                reason: "store unavailable".to_string(),
            });
        }
        let id = existing.cloned().unwrap_or_else(DesignId::generate);
        self.designs.lock().insert(id.clone(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn load(&self, id: &DesignId) -> Result<DesignDocument, PersistenceError> {
        self.get(id)
            .ok_or_else(|| PersistenceError::NotFound { id: id.to_string() })
    }
}
