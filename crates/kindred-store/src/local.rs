use async_trait::async_trait;
use kindred_core::{Graph, Library, LibraryError};
use tracing::debug;

use crate::{DocumentStore, StoreResult};

/// A document in the on-disk tree library.
#[derive(Debug, Clone)]
pub struct LocalStore {
    library: Library,
    document: String,
}

impl LocalStore {
    pub fn new(library: Library, document: impl Into<String>) -> Self {
        Self {
            library,
            document: document.into(),
        }
    }

    /// `document` in `~/.kindred/trees/`.
    pub fn open_default(document: &str) -> Self {
        Self::new(Library::open_default(), document)
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self) -> StoreResult<Option<Graph>> {
        let (library, document) = (self.library.clone(), self.document.clone());
        match tokio::task::spawn_blocking(move || library.read_tree(&document)).await? {
            Ok(graph) => Ok(Some(graph)),
            Err(LibraryError::NotFound(_)) => {
                debug!(document = %self.document, "no saved tree");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, graph: &Graph) -> StoreResult<()> {
        let (library, document, graph) = (self.library.clone(), self.document.clone(), graph.clone());
        tokio::task::spawn_blocking(move || library.write_tree(&document, &graph)).await??;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        let dir = self.library.dir().to_path_buf();
        matches!(
            tokio::task::spawn_blocking(move || std::fs::create_dir_all(dir)).await,
            Ok(Ok(()))
        )
    }
}
