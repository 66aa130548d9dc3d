//! Translation: one batched call for every summarized item.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tubedigest_common::{ContentId, Error, Result, Stage};
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::contents;

use super::{cancellable, CycleReport, Worker};
use crate::providers::Translator;

pub struct TranslationWorker {
    db: DbPool,
    translator: Arc<dyn Translator>,
    source_language: String,
    target_language: String,
    interval: Duration,
}

impl TranslationWorker {
    pub fn new(
        db: DbPool,
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            translator,
            source_language: source_language.into(),
            target_language: target_language.into(),
            interval,
        }
    }
}

#[async_trait]
impl Worker for TranslationWorker {
    fn name(&self) -> &'static str {
        "translation"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let items = {
            let conn = get_conn(&self.db)?;
            contents::list_ready(&conn, Stage::Summarized, None)?
        };

        let mut report = CycleReport {
            selected: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            return Ok(report);
        }

        let ids: Vec<ContentId> = items.iter().map(|i| i.id).collect();
        let texts: Vec<String> = items
            .iter()
            .map(|i| i.summary_primary.clone().unwrap_or_default())
            .collect();

        let translated = match cancellable(
            cancel,
            self.translator
                .translate(&self.source_language, &self.target_language, &texts),
        )
        .await
        {
            Ok(t) => t,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                report.failed = items.len();
                tracing::warn!(count = items.len(), error = %e, "Translation batch failed");
                return Ok(report);
            }
        };

        if translated.len() != ids.len() {
            return Err(Error::format(format!(
                "expected {} translations, got {}",
                ids.len(),
                translated.len()
            )));
        }

        let batch: Vec<(ContentId, String)> = ids.into_iter().zip(translated).collect();
        let stored = {
            let conn = get_conn(&self.db)?;
            contents::record_translations(&conn, &batch)?
        };

        report.completed = stored;
        report.skipped = items.len() - stored;
        tracing::info!(
            stored,
            target = %self.target_language,
            "Translations stored"
        );
        Ok(report)
    }
}
