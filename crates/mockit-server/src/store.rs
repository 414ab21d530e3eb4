//! Live configuration store.
//!
//! Readers take an `Arc<Snapshot>` once per request and keep it for the
//! whole request. Writers build a complete new snapshot and swap it in, so
//! an in-flight request never sees a half-applied change.

use crate::config::{ConfigDocument, ConfigError, Settings};
use crate::routing::RouteTable;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Route not found: {0}")]
    RouteNotFound(String),
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// A document together with the route table built from it.
pub struct Snapshot {
    pub document: ConfigDocument,
    pub table: RouteTable,
}

impl Snapshot {
    pub fn new(document: ConfigDocument) -> Self {
        let table = RouteTable::build(&document.routes);
        Self { document, table }
    }

    pub fn settings(&self) -> &Settings {
        &self.document.settings
    }
}

pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<Snapshot>>,
    // Serializes read-modify-write cycles so concurrent admin calls do not
    // lose each other's changes.
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Load the document at `path`. Mutations are written back to it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let document = ConfigDocument::from_file(&path)?;
        let store = Self::with_document(Some(path), document);
        store.log_loaded("Loaded configuration");
        Ok(store)
    }

    /// A store that is never persisted.
    pub fn in_memory(document: ConfigDocument) -> Self {
        Self::with_document(None, document)
    }

    fn with_document(path: Option<PathBuf>, document: ConfigDocument) -> Self {
        Self {
            path,
            current: RwLock::new(Arc::new(Snapshot::new(document))),
            write_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Re-read the backing file. On error the current snapshot stays live.
    /// A store without a file keeps its snapshot unchanged.
    pub fn reload(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let Some(path) = &self.path else {
            return Ok(());
        };
        let document = ConfigDocument::from_file(path)?;
        self.publish(document);
        self.log_loaded("Reloaded configuration");
        Ok(())
    }

    /// Apply `change` to a copy of the current document, persist it, then
    /// publish it. Nothing is published if any step fails.
    pub fn update<R>(
        &self,
        change: impl FnOnce(&mut ConfigDocument) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock();

        let mut document = self.snapshot().document.clone();
        let result = change(&mut document)?;
        document.validate()?;

        if let Some(path) = &self.path {
            document.write_to(path)?;
        }
        self.publish(document);
        Ok(result)
    }

    fn publish(&self, document: ConfigDocument) {
        let snapshot = Arc::new(Snapshot::new(document));
        *self.current.write() = snapshot;
    }

    fn log_loaded(&self, message: &str) {
        let snapshot = self.snapshot();
        info!(
            path = ?self.path,
            routes = snapshot.document.routes.len(),
            served = snapshot.table.len(),
            "{}",
            message
        );
    }
}
