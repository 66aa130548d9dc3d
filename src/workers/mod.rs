//! The five enrichment workers and the loop that drives them.
//!
//! Each worker scans the store for items in its input
//! [`Stage`](tubedigest_common::Stage), performs
//! one enrichment step per item and writes the result back with a
//! stage-guarded update. Workers never call each other; the stage tag is the
//! only coordination between them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tubedigest_common::{Error, Result};

pub mod discovery;
pub mod publication;
pub mod summarization;
pub mod transcription;
pub mod translation;

pub use discovery::DiscoveryWorker;
pub use publication::PublicationWorker;
pub use summarization::SummarizationWorker;
pub use transcription::{PauseRange, TranscriptionWorker};
pub use translation::TranslationWorker;

/// Outcome counts for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records (or channels, for discovery) picked up by the cycle.
    pub selected: usize,
    pub completed: usize,
    /// Left unresolved without an error, e.g. no captions yet.
    pub skipped: usize,
    pub failed: usize,
}

/// A recurring enrichment task.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Delay between the end of one cycle and the start of the next.
    fn interval(&self) -> Duration;

    /// Process everything currently ready for this worker.
    ///
    /// Per-item failures are handled inside the cycle. An `Err` means the
    /// cycle as a whole could not run (store unreachable, batch call failed)
    /// or was cancelled.
    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport>;
}

/// Which worker to address from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum WorkerKind {
    Discovery,
    Transcription,
    Summarization,
    Translation,
    Publication,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 5] = [
        WorkerKind::Discovery,
        WorkerKind::Transcription,
        WorkerKind::Summarization,
        WorkerKind::Translation,
        WorkerKind::Publication,
    ];
}

/// Drive `worker` until `cancel` fires.
///
/// The first cycle starts immediately. Each cycle runs in its own task so a
/// panic ends only that cycle. Transient errors are logged as warnings and
/// others as errors. Only [`Error::Cancelled`] and fatal errors stop the loop.
pub async fn run_worker(worker: Arc<dyn Worker>, cancel: CancellationToken) {
    let name = worker.name();
    tracing::info!(worker = name, interval_secs = worker.interval().as_secs(), "Worker started");

    loop {
        if cancel.is_cancelled() {
            tracing::info!(worker = name, "Worker shutting down");
            break;
        }

        let cycle_worker = Arc::clone(&worker);
        let cycle_cancel = cancel.clone();
        let handle =
            tokio::spawn(async move { cycle_worker.run_cycle(&cycle_cancel).await });

        match handle.await {
            Ok(Ok(report)) => log_report(name, &report),
            Ok(Err(Error::Cancelled)) => {
                tracing::info!(worker = name, "Cycle cancelled");
                break;
            }
            Ok(Err(e)) if e.is_fatal() => {
                tracing::error!(worker = name, error = %e, "Worker cannot run, stopping");
                break;
            }
            Ok(Err(e)) if e.is_transient() => {
                tracing::warn!(worker = name, error = %e, "Cycle failed, retrying next interval");
            }
            Ok(Err(e)) => {
                tracing::error!(worker = name, error = %e, "Cycle failed");
            }
            Err(e) => {
                tracing::error!(worker = name, error = %e, "Cycle task aborted");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(worker.interval()) => {}
            _ = cancel.cancelled() => { break; }
        }
    }

    tracing::info!(worker = name, "Worker stopped");
}

fn log_report(name: &str, report: &CycleReport) {
    if report.selected == 0 {
        tracing::debug!(worker = name, "Nothing to do");
    } else {
        tracing::info!(
            worker = name,
            selected = report.selected,
            completed = report.completed,
            skipped = report.skipped,
            failed = report.failed,
            "Cycle finished"
        );
    }
}

/// Await `fut` unless `cancel` fires first, in which case
/// [`Error::Cancelled`] is returned and `fut` is dropped.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Sleep for `duration`, returning early with [`Error::Cancelled`] on shutdown.
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    cancellable(cancel, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}
