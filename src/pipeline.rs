//! Wiring: build capabilities from configuration, construct the five
//! workers and run them until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tubedigest_captions::{CaptionSource, YtDlp};
use tubedigest_common::{Error, Result};
use tubedigest_db::pool::{init_pool, DbPool};

use crate::config::{database_path, Config};
use crate::providers::{
    AzureTranslator, ChatCompletionClient, GraphPoster, MetadataProvider, SocialPoster, Summarizer,
    Translator, YoutubeClient,
};
use crate::workers::{
    run_worker, CycleReport, DiscoveryWorker, PauseRange, PublicationWorker, SummarizationWorker,
    TranscriptionWorker, TranslationWorker, Worker, WorkerKind,
};

/// Every external collaborator the workers need.
#[derive(Clone)]
pub struct Capabilities {
    pub metadata: Arc<dyn MetadataProvider>,
    pub captions: Arc<dyn CaptionSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub translator: Arc<dyn Translator>,
    pub poster: Arc<dyn SocialPoster>,
}

impl Capabilities {
    /// Build the production clients.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when a credential is missing or yt-dlp cannot be found.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_credentials()?;

        let captions = YtDlp::discover(
            config.captions.yt_dlp_path.as_deref(),
            config.captions.language.clone(),
            Duration::from_secs(config.captions.timeout_secs),
        )?;
        tracing::debug!(program = ?captions.program(), "Using caption tool");

        Ok(Self {
            metadata: Arc::new(YoutubeClient::from_config(&config.youtube)?),
            captions: Arc::new(captions),
            summarizer: Arc::new(ChatCompletionClient::from_config(&config.summarizer)?),
            translator: Arc::new(AzureTranslator::from_config(&config.translator)?),
            poster: Arc::new(GraphPoster::from_config(&config.publisher)?),
        })
    }
}

/// Construct one worker from a full set of capabilities.
pub fn build_worker(
    kind: WorkerKind,
    config: &Config,
    db: &DbPool,
    caps: &Capabilities,
) -> Result<Arc<dyn Worker>> {
    match kind {
        WorkerKind::Discovery => Ok(discovery(config, db, Arc::clone(&caps.metadata))),
        WorkerKind::Transcription => Ok(transcription(config, db, Arc::clone(&caps.captions))),
        WorkerKind::Summarization => Ok(summarization(config, db, Arc::clone(&caps.summarizer))),
        WorkerKind::Translation => Ok(translation(config, db, Arc::clone(&caps.translator))),
        WorkerKind::Publication => publication(config, db, Arc::clone(&caps.poster)),
    }
}

/// Construct one worker, building only the client it talks to.
///
/// Used by `run-once`, so a single stage can run while the credentials of
/// the other stages are still missing.
///
/// # Errors
///
/// [`Error::Config`] when that client's own settings are incomplete.
pub fn build_standalone_worker(
    kind: WorkerKind,
    config: &Config,
    db: &DbPool,
) -> Result<Arc<dyn Worker>> {
    match kind {
        WorkerKind::Discovery => {
            let metadata = YoutubeClient::from_config(&config.youtube)?;
            Ok(discovery(config, db, Arc::new(metadata)))
        }
        WorkerKind::Transcription => {
            let captions = YtDlp::discover(
                config.captions.yt_dlp_path.as_deref(),
                config.captions.language.clone(),
                Duration::from_secs(config.captions.timeout_secs),
            )?;
            Ok(transcription(config, db, Arc::new(captions)))
        }
        WorkerKind::Summarization => {
            let summarizer = ChatCompletionClient::from_config(&config.summarizer)?;
            Ok(summarization(config, db, Arc::new(summarizer)))
        }
        WorkerKind::Translation => {
            let translator = AzureTranslator::from_config(&config.translator)?;
            Ok(translation(config, db, Arc::new(translator)))
        }
        WorkerKind::Publication => {
            let poster = GraphPoster::from_config(&config.publisher)?;
            publication(config, db, Arc::new(poster))
        }
    }
}

fn discovery(config: &Config, db: &DbPool, metadata: Arc<dyn MetadataProvider>) -> Arc<dyn Worker> {
    Arc::new(DiscoveryWorker::new(
        db.clone(),
        metadata,
        Duration::from_secs(config.youtube.min_length_secs),
        Duration::from_secs(config.schedule.discovery_secs),
    ))
}

fn transcription(config: &Config, db: &DbPool, captions: Arc<dyn CaptionSource>) -> Arc<dyn Worker> {
    let pause = PauseRange::new(
        Duration::from_secs(config.captions.pause_min_secs),
        Duration::from_secs(config.captions.pause_max_secs),
    );
    let worker = TranscriptionWorker::new(
        db.clone(),
        captions,
        pause,
        Duration::from_secs(config.schedule.transcription_secs),
    );
    match &config.captions.scratch_dir {
        Some(dir) => Arc::new(worker.with_scratch_root(dir)),
        None => Arc::new(worker),
    }
}

fn summarization(config: &Config, db: &DbPool, summarizer: Arc<dyn Summarizer>) -> Arc<dyn Worker> {
    Arc::new(SummarizationWorker::new(
        db.clone(),
        summarizer,
        Duration::from_secs(config.schedule.summarization_secs),
    ))
}

fn translation(config: &Config, db: &DbPool, translator: Arc<dyn Translator>) -> Arc<dyn Worker> {
    Arc::new(TranslationWorker::new(
        db.clone(),
        translator,
        config.translator.source_language.clone(),
        config.translator.target_language.clone(),
        Duration::from_secs(config.schedule.translation_secs),
    ))
}

fn publication(
    config: &Config,
    db: &DbPool,
    poster: Arc<dyn SocialPoster>,
) -> Result<Arc<dyn Worker>> {
    let page_id = config
        .publisher
        .page_id
        .clone()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| Error::Config("publisher.page_id is not set".into()))?;
    Ok(Arc::new(PublicationWorker::new(
        db.clone(),
        poster,
        page_id,
        config.publisher.disclaimer.clone(),
        Duration::from_secs(config.schedule.publication_secs),
    )))
}

/// Construct all five workers in pipeline order.
pub fn build_workers(
    config: &Config,
    db: &DbPool,
    caps: &Capabilities,
) -> Result<Vec<Arc<dyn Worker>>> {
    WorkerKind::ALL
        .iter()
        .map(|kind| build_worker(*kind, config, db, caps))
        .collect()
}

/// The running set of worker tasks.
pub struct Pipeline {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Pipeline {
    /// Spawn one task per worker, each with a child of a shared token.
    pub fn spawn(workers: Vec<Arc<dyn Worker>>) -> Self {
        let cancel = CancellationToken::new();
        let handles = workers
            .into_iter()
            .map(|worker| {
                let name = worker.name();
                let token = cancel.child_token();
                (name, tokio::spawn(run_worker(worker, token)))
            })
            .collect();

        Self { cancel, handles }
    }

    /// Token that stops every worker when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel all workers and wait for their tasks to end.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(worker = name, "Worker task ended abnormally: {e}");
            }
        }
        tracing::info!("Pipeline stopped");
    }
}

/// Run the whole pipeline until SIGINT or SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let caps = Capabilities::from_config(&config)?;
    let db = init_pool(&database_path(&config), &config.database.pool_settings())?;
    let workers = build_workers(&config, &db, &caps)?;

    tracing::info!(workers = workers.len(), "Starting pipeline");
    let pipeline = Pipeline::spawn(workers);

    shutdown_signal(pipeline.cancel_token()).await;
    pipeline.shutdown().await;
    Ok(())
}

/// Run a single cycle of one worker, stopping early on Ctrl+C.
pub async fn run_once(config: Config, kind: WorkerKind) -> anyhow::Result<CycleReport> {
    let db = init_pool(&database_path(&config), &config.database.pool_settings())?;
    let worker = build_standalone_worker(kind, &config, &db)?;

    let cancel = CancellationToken::new();
    let signal = tokio::spawn(shutdown_signal(cancel.clone()));
    let result = worker.run_cycle(&cancel).await;
    // Releases the signal task; it does not log for this cancel.
    cancel.cancel();
    let _ = signal.await;

    Ok(result?)
}

/// Wait for SIGINT or SIGTERM, then cancel `cancel`.
///
/// Returns quietly if `cancel` fires first.
pub async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Interrupt received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
        _ = cancel.cancelled() => return,
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tubedigest_db::pool::init_memory_pool;

    // `assert_matches!` formats the scrutinee on failure, so the worker
    // trait object needs a Debug impl in tests.
    impl std::fmt::Debug for dyn crate::workers::Worker {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Worker").field("name", &self.name()).finish()
        }
    }

    fn youtube_only() -> Config {
        let mut config = Config::default();
        config.youtube.api_key = Some("yt-key".into());
        config
    }

    #[test]
    fn standalone_discovery_needs_only_youtube_key() {
        let db = init_memory_pool().unwrap();
        let worker = build_standalone_worker(WorkerKind::Discovery, &youtube_only(), &db).unwrap();
        assert_eq!(worker.name(), "discovery");
        assert_eq!(worker.interval(), Duration::from_secs(3600));
    }

    #[test]
    fn standalone_worker_reports_its_own_missing_setting() {
        let db = init_memory_pool().unwrap();
        let config = youtube_only();

        assert_matches!(
            build_standalone_worker(WorkerKind::Translation, &config, &db),
            Err(Error::Config(msg)) if msg.contains("translator.api_key")
        );
        assert_matches!(
            build_standalone_worker(WorkerKind::Publication, &config, &db),
            Err(Error::Config(msg)) if msg.contains("publisher.access_token")
        );
    }

    #[test]
    fn publication_needs_page_id() {
        let db = init_memory_pool().unwrap();
        let mut config = Config::default();
        config.publisher.access_token = Some("token".into());

        assert_matches!(
            build_standalone_worker(WorkerKind::Publication, &config, &db),
            Err(Error::Config(msg)) if msg.contains("page_id")
        );
    }

    #[tokio::test]
    async fn shutdown_signal_returns_on_own_cancel() {
        let cancel = CancellationToken::new();
        let waiter = tokio::spawn(shutdown_signal(cancel.clone()));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
