//! Persistence for Kindred trees.
//!
//! A [`DocumentStore`] loads and saves a single tree document. The backend is
//! chosen from [`StorageSettings`]: the on-disk library, or a remote HTTP
//! document store. [`AutoSaver`] sits in front of a store and coalesces rapid
//! edits into one write of the latest snapshot.

mod autosave;
mod local;
mod memory;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use kindred_core::settings::{Backend, StorageSettings};
use kindred_core::{Graph, ImportError, LibraryError};
use thiserror::Error;

pub use autosave::{AutoSaver, SaveStatus, DEFAULT_DEBOUNCE};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("Stored document is invalid: {0}")]
    Document(#[from] ImportError),
    #[error("Could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server replied {status}")]
    Status { status: u16 },
    #[error("Remote storage needs an endpoint")]
    MissingEndpoint,
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Load/save boundary for one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// The stored tree, or `None` if nothing has been saved yet.
    async fn load(&self) -> StoreResult<Option<Graph>>;

    /// Replace the stored tree.
    async fn save(&self, graph: &Graph) -> StoreResult<()>;

    /// Whether the backend is reachable and usable.
    async fn test_connection(&self) -> bool {
        self.load().await.is_ok()
    }
}

/// Build the backend selected by `settings`.
pub fn open_store(settings: &StorageSettings) -> StoreResult<Arc<dyn DocumentStore>> {
    match settings.backend {
        Backend::Local => Ok(Arc::new(LocalStore::open_default(&settings.document))),
        Backend::Remote => Ok(Arc::new(RemoteStore::new(
            &settings.endpoint,
            &settings.api_key,
            &settings.document,
        )?)),
    }
}

/// Probe the backend described by `settings` without keeping it.
pub async fn test_connection(settings: &StorageSettings) -> bool {
    match open_store(settings) {
        Ok(store) => store.test_connection().await,
        Err(e) => {
            tracing::warn!(error = %e, "storage backend misconfigured");
            false
        }
    }
}
