use crate::core::profile_store::ProfileStore;
use crate::domain::model::{PortraitImage, SaveOutcome};
use crate::domain::ports::{BlobStore, ImageCodec, PersistenceBackend};
use crate::utils::error::{ProfileError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Job {
    Write(PortraitImage),
    Flush(oneshot::Sender<WriterStats>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub saved: u64,
    pub failed: u64,
}

/// Moves portrait encoding and writing off the caller's thread.
///
/// A single worker drains the queue and waits for each write before taking
/// the next one, so writes to the fixed blob land in submission order.
pub struct PortraitWriter {
    sender: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<WriterStats>,
}

impl PortraitWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn<B, S, C>(store: Arc<ProfileStore<B, S, C>>) -> Self
    where
        B: PersistenceBackend + 'static,
        S: BlobStore + 'static,
        C: ImageCodec + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker = tokio::spawn(async move {
            let mut stats = WriterStats::default();

            while let Some(job) = receiver.recv().await {
                match job {
                    Job::Write(portrait) => {
                        let store = Arc::clone(&store);
                        match tokio::task::spawn_blocking(move || store.save_portrait(&portrait)).await {
                            Ok(SaveOutcome::Saved) => stats.saved += 1,
                            Ok(SaveOutcome::Failed) => stats.failed += 1,
                            Err(e) => {
                                tracing::error!("Portrait write task aborted: {}", e);
                                stats.failed += 1;
                            }
                        }
                    }
                    Job::Flush(ack) => {
                        let _ = ack.send(stats);
                    }
                }
            }

            tracing::debug!(
                "Portrait writer stopped ({} saved, {} failed)",
                stats.saved,
                stats.failed
            );
            stats
        });

        Self { sender, worker }
    }

    pub fn submit(&self, portrait: PortraitImage) -> Result<()> {
        self.sender
            .send(Job::Write(portrait))
            .map_err(|_| ProfileError::WorkerError {
                message: "portrait writer has stopped".to_string(),
            })
    }

    /// Resolves once every portrait submitted before this call is written.
    pub async fn flush(&self) -> Result<WriterStats> {
        let (ack, done) = oneshot::channel();
        self.sender
            .send(Job::Flush(ack))
            .map_err(|_| ProfileError::WorkerError {
                message: "portrait writer has stopped".to_string(),
            })?;

        done.await.map_err(|_| ProfileError::WorkerError {
            message: "portrait writer dropped a flush request".to_string(),
        })
    }

    /// Drains the queue and stops the worker.
    pub async fn shutdown(self) -> Result<WriterStats> {
        drop(self.sender);
        self.worker.await.map_err(|e| ProfileError::WorkerError {
            message: e.to_string(),
        })
    }
}
