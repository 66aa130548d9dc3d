//! Publication: post translated summaries to the social page.
//!
//! Published flags are written in one batch after the whole loop. If a post
//! fails part-way, items already posted in this cycle keep their
//! `translated` stage and will be posted again on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tubedigest_common::{ContentId, Result, Stage};
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::contents;

use super::{cancellable, CycleReport, Worker};
use crate::providers::SocialPoster;

/// Post body: the translated summary, a blank line, then the disclaimer.
pub fn compose_message(summary: &str, disclaimer: &str) -> String {
    let disclaimer = disclaimer.trim();
    if disclaimer.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n\n{disclaimer}")
    }
}

pub struct PublicationWorker {
    db: DbPool,
    poster: Arc<dyn SocialPoster>,
    page_id: String,
    disclaimer: String,
    interval: Duration,
}

impl PublicationWorker {
    pub fn new(
        db: DbPool,
        poster: Arc<dyn SocialPoster>,
        page_id: impl Into<String>,
        disclaimer: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            poster,
            page_id: page_id.into(),
            disclaimer: disclaimer.into(),
            interval,
        }
    }
}

#[async_trait]
impl Worker for PublicationWorker {
    fn name(&self) -> &'static str {
        "publication"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let items = {
            let conn = get_conn(&self.db)?;
            contents::list_ready(&conn, Stage::Translated, None)?
        };

        let mut report = CycleReport {
            selected: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            return Ok(report);
        }

        let mut posted: Vec<(ContentId, String)> = Vec::with_capacity(items.len());
        let mut posted_videos: Vec<&str> = Vec::with_capacity(items.len());

        for item in &items {
            let message = compose_message(
                item.summary_translated.as_deref().unwrap_or_default(),
                &self.disclaimer,
            );
            let link = item.source_url();

            let result = cancellable(
                cancel,
                self.poster
                    .post(&self.page_id, Some(link.as_str()), Some(message.as_str())),
            )
            .await;

            match result {
                Ok(post_id) => {
                    tracing::info!(video_id = %item.video_id, post_id = %post_id, "Posted");
                    posted.push((item.id, post_id));
                    posted_videos.push(&item.video_id);
                }
                Err(e) => {
                    if !posted_videos.is_empty() {
                        tracing::warn!(
                            failed_video_id = %item.video_id,
                            already_posted = ?posted_videos,
                            "Publication stopped mid-batch; already posted items are not marked and will be posted again"
                        );
                    }
                    return Err(e);
                }
            }
        }

        let stored = {
            let conn = get_conn(&self.db)?;
            contents::mark_published(&conn, &posted)?
        };
        report.completed = stored;
        report.skipped = items.len() - stored;

        Ok(report)
    }
}
