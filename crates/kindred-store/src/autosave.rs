use std::sync::Arc;
use std::time::Duration;

use kindred_core::Graph;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::DocumentStore;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum SaveStatus {
    Saved,
    /// A snapshot is waiting for the debounce to elapse.
    Pending,
    Saving,
    /// The last write failed; the snapshot is kept and retried on the next
    /// flush or schedule.
    Unsaved { error: String },
}

enum Command {
    Schedule(Graph),
    Flush(oneshot::Sender<SaveStatus>),
    Shutdown(oneshot::Sender<SaveStatus>),
}

/// Debounced writer. Each `schedule` replaces the pending snapshot and
/// restarts the timer; only the latest snapshot is written. Writes run one at
/// a time on a background task, so they never interleave.
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl AutoSaver {
    /// Spawn the writer on the current tokio runtime.
    pub fn new(store: Arc<dyn DocumentStore>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Saved);
        tokio::spawn(Worker::new(store, status_tx).run(rx, debounce));
        Self { tx, status }
    }

    pub fn schedule(&self, graph: Graph) {
        if self.tx.send(Command::Schedule(graph)).is_err() {
            warn!("autosave worker has stopped; snapshot dropped");
        }
    }

    /// Write the pending snapshot now, or retry a failed one.
    pub async fn flush(&self) -> SaveStatus {
        let (reply, done) = oneshot::channel();
        if self.tx.send(Command::Flush(reply)).is_err() {
            return self.status();
        }
        done.await.unwrap_or_else(|_| self.status())
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Flush and stop the worker.
    pub async fn shutdown(self) -> SaveStatus {
        let (reply, done) = oneshot::channel();
        if self.tx.send(Command::Shutdown(reply)).is_err() {
            return self.status();
        }
        done.await.unwrap_or_else(|_| self.status())
    }
}

struct Worker {
    store: Arc<dyn DocumentStore>,
    status: watch::Sender<SaveStatus>,
    pending: Option<Graph>,
}

impl Worker {
    fn new(store: Arc<dyn DocumentStore>, status: watch::Sender<SaveStatus>) -> Self {
        Self {
            store,
            status,
            pending: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>, debounce: Duration) {
        let mut deadline: Option<Instant> = None;
        loop {
            let cmd = match deadline {
                Some(at) => tokio::select! {
                    cmd = rx.recv() => cmd,
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        self.write().await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };
            match cmd {
                Some(Command::Schedule(graph)) => {
                    self.pending = Some(graph);
                    deadline = Some(Instant::now() + debounce);
                    self.status.send_replace(SaveStatus::Pending);
                }
                Some(Command::Flush(reply)) => {
                    deadline = None;
                    let status = self.write().await;
                    let _ = reply.send(status);
                }
                Some(Command::Shutdown(reply)) => {
                    let status = self.write().await;
                    let _ = reply.send(status);
                    break;
                }
                None => {
                    self.write().await;
                    break;
                }
            }
        }
        debug!(store = self.store.name(), "autosave worker stopped");
    }

    async fn write(&mut self) -> SaveStatus {
        let Some(graph) = self.pending.take() else {
            return self.status.borrow().clone();
        };
        self.status.send_replace(SaveStatus::Saving);
        let status = match self.store.save(&graph).await {
            Ok(()) => {
                info!(store = self.store.name(), members = graph.member_count(), "tree saved");
                SaveStatus::Saved
            }
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "save failed, keeping snapshot for retry");
                self.pending = Some(graph);
                SaveStatus::Unsaved { error: e.to_string() }
            }
        };
        self.status.send_replace(status.clone());
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use kindred_core::{insert_child, Gender, Member};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn base() -> Graph {
        Graph::new(Member::new("r", "Root", Gender::Male))
    }

    fn saver(store: &Arc<MemoryStore>) -> AutoSaver {
        AutoSaver::new(Arc::clone(store) as Arc<dyn DocumentStore>, DEBOUNCE)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_writes_latest_once() {
        let store = Arc::new(MemoryStore::new());
        let saver = saver(&store);
        let g1 = base();
        let g2 = insert_child(&g1, "r", Gender::Female).graph;
        let g3 = insert_child(&g2, "r", Gender::Male).graph;
        saver.schedule(g1);
        saver.schedule(g2);
        saver.schedule(g3.clone());

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
        assert_eq!(store.saves(), 1);
        assert_eq!(store.stored().await, Some(g3));
        assert_eq!(saver.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn new_schedule_restarts_the_timer() {
        let store = Arc::new(MemoryStore::new());
        let saver = saver(&store);
        saver.schedule(base());
        tokio::time::sleep(DEBOUNCE / 2).await;
        saver.schedule(insert_child(&base(), "r", Gender::Other).graph);

        tokio::time::sleep(DEBOUNCE / 2 + Duration::from_millis(10)).await;
        assert_eq!(store.saves(), 0);
        assert_eq!(saver.status(), SaveStatus::Pending);

        tokio::time::sleep(DEBOUNCE).await;
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_is_retried_on_flush() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let saver = saver(&store);
        saver.schedule(base());
        tokio::time::sleep(DEBOUNCE * 2).await;
        assert!(matches!(saver.status(), SaveStatus::Unsaved { .. }));
        assert_eq!(store.saves(), 0);

        store.set_failing(false);
        assert_eq!(saver.flush().await, SaveStatus::Saved);
        assert_eq!(store.stored().await, Some(base()));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_without_pending_changes_is_quiet() {
        let store = Arc::new(MemoryStore::new());
        let saver = saver(&store);
        assert_eq!(saver.flush().await, SaveStatus::Saved);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_writes_pending_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let saver = saver(&store);
        let mut status = saver.subscribe();
        saver.schedule(base());
        status.changed().await.unwrap();
        assert_eq!(*status.borrow(), SaveStatus::Pending);

        assert_eq!(saver.shutdown().await, SaveStatus::Saved);
        assert_eq!(store.saves(), 1);
    }
}
