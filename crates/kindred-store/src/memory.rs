use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use kindred_core::Graph;
use tokio::sync::Mutex;

use crate::{DocumentStore, StoreError, StoreResult};

/// In-memory backend for tests and sessions that should not touch disk.
///
/// `set_failing(true)` makes every call fail, to exercise retry paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Graph>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(graph: Graph) -> Self {
        Self {
            document: Mutex::new(Some(graph)),
            ..Default::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Option<Graph> {
        self.document.lock().await.clone()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> StoreResult<Option<Graph>> {
        self.check()?;
        Ok(self.stored().await)
    }

    async fn save(&self, graph: &Graph) -> StoreResult<()> {
        self.check()?;
        *self.document.lock().await = Some(graph.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
