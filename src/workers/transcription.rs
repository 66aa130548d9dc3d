//! Transcription: download captions for discovered items and normalize them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tubedigest_captions::{normalize_transcript, CaptionOutcome, CaptionSource, ScratchWorkspace};
use tubedigest_common::{Error, Result, Stage};
use tubedigest_db::models::ContentItem;
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::contents;

use super::{cancellable, pause, CycleReport, Worker};

/// Bounds of the randomized pause between two caption downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseRange {
    pub min: Duration,
    pub max: Duration,
}

impl PauseRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all; for tests and one-off runs.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Uniform sample in `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

enum ItemOutcome {
    Stored,
    NoCaptions,
    /// Another writer advanced the item first.
    Stale,
}

pub struct TranscriptionWorker {
    db: DbPool,
    captions: Arc<dyn CaptionSource>,
    scratch_root: Option<PathBuf>,
    pause: PauseRange,
    interval: Duration,
}

impl TranscriptionWorker {
    pub fn new(
        db: DbPool,
        captions: Arc<dyn CaptionSource>,
        pause: PauseRange,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            captions,
            scratch_root: None,
            pause,
            interval,
        }
    }

    /// Create scratch workspaces under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    async fn transcribe(&self, item: &ContentItem, cancel: &CancellationToken) -> Result<ItemOutcome> {
        // Dropped on every exit path below, removing the directory.
        let workspace = match &self.scratch_root {
            Some(root) => ScratchWorkspace::new_in(root)?,
            None => ScratchWorkspace::new()?,
        };

        let outcome =
            cancellable(cancel, self.captions.fetch(&item.video_id, workspace.path())).await?;
        let path = match outcome {
            CaptionOutcome::Captions(path) => path,
            CaptionOutcome::NoCaptions => return Ok(ItemOutcome::NoCaptions),
        };

        let raw = tokio::fs::read_to_string(&path).await?;
        let filtered = normalize_transcript(&raw);

        let stored = {
            let conn = get_conn(&self.db)?;
            contents::record_transcript(&conn, item.id, &raw, &filtered)?
        };
        // The transcript is committed; a leftover directory is not an item failure.
        if let Err(e) = workspace.close() {
            tracing::warn!(video_id = %item.video_id, error = %e, "Could not remove scratch workspace");
        }

        Ok(if stored {
            ItemOutcome::Stored
        } else {
            ItemOutcome::Stale
        })
    }
}

#[async_trait]
impl Worker for TranscriptionWorker {
    fn name(&self) -> &'static str {
        "transcription"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let items = {
            let conn = get_conn(&self.db)?;
            contents::list_ready(&conn, Stage::Discovered, None)?
        };

        let mut report = CycleReport {
            selected: items.len(),
            ..Default::default()
        };

        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                let wait = self.pause.sample();
                tracing::debug!(wait_secs = wait.as_secs(), "Pausing before next download");
                pause(cancel, wait).await?;
            }

            match self.transcribe(item, cancel).await {
                Ok(ItemOutcome::Stored) => {
                    report.completed += 1;
                    tracing::info!(video_id = %item.video_id, "Transcript stored");
                }
                Ok(ItemOutcome::NoCaptions) => {
                    report.skipped += 1;
                    tracing::info!(
                        video_id = %item.video_id,
                        "No captions available yet, will retry next cycle"
                    );
                }
                Ok(ItemOutcome::Stale) => {
                    report.skipped += 1;
                    tracing::debug!(video_id = %item.video_id, "Item already advanced");
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        video_id = %item.video_id,
                        error = %e,
                        "Caption download failed"
                    );
                }
            }
        }

        Ok(report)
    }
}
