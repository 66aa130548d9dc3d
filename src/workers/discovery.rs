//! Discovery: find new long-form uploads for every active channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tubedigest_common::{filter_by_keywords, parse_duration, Error, Result};
use tubedigest_db::models::{Channel, NewContent};
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::{channels, contents};

use super::{cancellable, CycleReport, Worker};
use crate::providers::{MetadataProvider, SearchHit, VideoDetails};

pub struct DiscoveryWorker {
    db: DbPool,
    metadata: Arc<dyn MetadataProvider>,
    min_length: Duration,
    interval: Duration,
}

impl DiscoveryWorker {
    pub fn new(
        db: DbPool,
        metadata: Arc<dyn MetadataProvider>,
        min_length: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            metadata,
            min_length,
            interval,
        }
    }

    /// Discover one channel. Returns the number of new items stored.
    async fn discover_channel(&self, channel: &Channel, cancel: &CancellationToken) -> Result<usize> {
        // The boundary item was stored last time; start one second later.
        let after = channel
            .last_published_at
            .map(|w| w + chrono::Duration::seconds(1));

        let hits = cancellable(cancel, self.metadata.search(&channel.id, after)).await?;
        let found = hits.len();
        let hits = filter_by_keywords(hits, channel.title_keywords.as_deref());
        tracing::debug!(
            channel_id = %channel.id,
            found,
            matching = hits.len(),
            "Search finished"
        );
        if hits.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = hits.iter().map(|h| h.video_id.clone()).collect();
        let details = cancellable(cancel, self.metadata.video_details(&ids)).await?;
        let accepted = select_long_videos(hits, &details, self.min_length)?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let conn = get_conn(&self.db)?;
        let commit = contents::commit_discovery(&conn, &channel.id, &accepted)?;
        Ok(commit.inserted)
    }
}

#[async_trait]
impl Worker for DiscoveryWorker {
    fn name(&self) -> &'static str {
        "discovery"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let active = {
            let conn = get_conn(&self.db)?;
            channels::list_active_channels(&conn)?
        };

        let mut report = CycleReport {
            selected: active.len(),
            ..Default::default()
        };

        for channel in &active {
            match self.discover_channel(channel, cancel).await {
                Ok(inserted) => {
                    report.completed += 1;
                    if inserted > 0 {
                        tracing::info!(channel_id = %channel.id, inserted, "New videos stored");
                    }
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        channel_id = %channel.id,
                        error = %e,
                        "Discovery failed, skipping channel this cycle"
                    );
                }
            }
        }

        Ok(report)
    }
}

/// Join search hits with their details and keep videos strictly longer than
/// `min_length`.
///
/// Hits without details are dropped. A duration that does not parse fails
/// the whole batch so the channel is retried as a unit.
pub(crate) fn select_long_videos(
    hits: Vec<SearchHit>,
    details: &[VideoDetails],
    min_length: Duration,
) -> Result<Vec<NewContent>> {
    let by_id: HashMap<&str, &VideoDetails> =
        details.iter().map(|d| (d.id.as_str(), d)).collect();

    let mut accepted = Vec::new();
    for hit in hits {
        let Some(detail) = by_id.get(hit.video_id.as_str()) else {
            tracing::debug!(video_id = %hit.video_id, "No details returned, dropping");
            continue;
        };

        let length = parse_duration(&detail.duration)?;
        if length <= min_length {
            tracing::debug!(
                video_id = %hit.video_id,
                length_secs = length.as_secs(),
                "Too short, dropping"
            );
            continue;
        }

        accepted.push(NewContent {
            title: detail.title.clone().unwrap_or(hit.title),
            video_id: hit.video_id,
            length,
            published_at: hit.published_at,
        });
    }

    Ok(accepted)
}
