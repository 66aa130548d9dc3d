//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which holds an in-memory DB, a test
//! configuration and stub implementations of every capability. Workers are
//! built through the same wiring the binary uses.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use tubedigest::config::Config;
use tubedigest::pipeline::{build_worker, Capabilities};
use tubedigest::providers::{
    ChannelDetails, ChannelMatch, MetadataProvider, SearchHit, SocialPoster, Summarizer,
    Translator, VideoDetails,
};
use tubedigest::workers::{CycleReport, Worker, WorkerKind};
use tubedigest_captions::{CaptionOutcome, CaptionSource};
use tubedigest_common::{Error, Result};
use tubedigest_db::models::{Channel, ContentItem, NewChannel};
use tubedigest_db::pool::{get_conn, init_memory_pool, DbPool};
use tubedigest_db::queries::{channels, contents};

pub const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\nHello\n\n2\n00:00:02,000 --> 00:00:04,000\nWelcome to the show\n";

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn hit(video_id: &str, title: &str, published_at: DateTime<Utc>) -> SearchHit {
    SearchHit {
        video_id: video_id.into(),
        title: title.into(),
        description: String::new(),
        published_at,
    }
}

// ---------------------------------------------------------------------------
// Stub capabilities
// ---------------------------------------------------------------------------

/// Video platform with a fixed catalogue per channel.
#[derive(Default)]
pub struct StubMetadata {
    pub uploads: Mutex<HashMap<String, Vec<SearchHit>>>,
    pub durations: Mutex<HashMap<String, String>>,
    /// `published_after` of every search, in call order.
    pub searches: Mutex<Vec<(String, Option<DateTime<Utc>>)>>,
    pub fail_search: Mutex<Option<String>>,
}

impl StubMetadata {
    pub fn add_upload(&self, channel_id: &str, hit: SearchHit, duration: &str) {
        self.durations
            .lock()
            .unwrap()
            .insert(hit.video_id.clone(), duration.to_string());
        self.uploads
            .lock()
            .unwrap()
            .entry(channel_id.to_string())
            .or_default()
            .push(hit);
    }
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    fn name(&self) -> &'static str {
        "stub-metadata"
    }

    async fn search(
        &self,
        channel_id: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchHit>> {
        self.searches
            .lock()
            .unwrap()
            .push((channel_id.to_string(), published_after));

        if self.fail_search.lock().unwrap().as_deref() == Some(channel_id) {
            return Err(Error::external("stub-metadata", "HTTP 503: unavailable"));
        }

        let uploads = self.uploads.lock().unwrap();
        Ok(uploads
            .get(channel_id)
            .map(|hits| {
                hits.iter()
                    .filter(|h| published_after.map_or(true, |after| h.published_at >= after))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
        let durations = self.durations.lock().unwrap();
        Ok(video_ids
            .iter()
            .filter_map(|id| {
                durations.get(id).map(|d| VideoDetails {
                    id: id.clone(),
                    duration: d.clone(),
                    title: None,
                    published_at: None,
                })
            })
            .collect())
    }

    async fn channel_details(&self, _channel_id: &str) -> Result<Option<ChannelDetails>> {
        Ok(None)
    }

    async fn search_channels(&self, _query: &str) -> Result<Vec<ChannelMatch>> {
        Ok(Vec::new())
    }
}

/// What the stub caption tool does for one video.
#[derive(Debug, Clone)]
pub enum CaptionBehavior {
    Write(String),
    /// Writes the captions beside the workspace, then deletes the workspace.
    WriteAndRemoveWorkdir(String),
    NoCaptions,
    Fail,
}

/// Caption tool that writes canned captions into the workspace it is given.
#[derive(Default)]
pub struct StubCaptions {
    pub behavior: Mutex<HashMap<String, CaptionBehavior>>,
    /// Every working directory the tool was handed.
    pub workdirs: Mutex<Vec<PathBuf>>,
}

impl StubCaptions {
    pub fn set(&self, video_id: &str, behavior: CaptionBehavior) {
        self.behavior
            .lock()
            .unwrap()
            .insert(video_id.to_string(), behavior);
    }
}

#[async_trait]
impl CaptionSource for StubCaptions {
    fn name(&self) -> &str {
        "stub-captions"
    }

    async fn fetch(&self, video_id: &str, workdir: &Path) -> Result<CaptionOutcome> {
        assert!(workdir.is_dir(), "workspace must exist during the call");
        self.workdirs.lock().unwrap().push(workdir.to_path_buf());
        std::fs::write(workdir.join("partial.part"), b"in progress")?;

        let behavior = self
            .behavior
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .unwrap_or(CaptionBehavior::Write(SRT.to_string()));

        match behavior {
            CaptionBehavior::Write(text) => {
                let path = workdir.join("subtitle.en.srt");
                std::fs::write(&path, text)?;
                Ok(CaptionOutcome::Captions(path))
            }
            CaptionBehavior::WriteAndRemoveWorkdir(text) => {
                let parent = workdir.parent().expect("workspace has a parent");
                let path = parent.join(format!("{video_id}.en.srt"));
                std::fs::write(&path, text)?;
                std::fs::remove_dir_all(workdir)?;
                Ok(CaptionOutcome::Captions(path))
            }
            CaptionBehavior::NoCaptions => Ok(CaptionOutcome::NoCaptions),
            CaptionBehavior::Fail => Err(Error::tool("stub-captions", "ERROR: Private video")),
        }
    }
}

/// Summarizer returning queued answers first, then a fixed one.
pub struct StubSummarizer {
    pub response: Mutex<String>,
    /// Answers handed out one per call before falling back to `response`.
    pub queued: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self {
            response: Mutex::new(
                "Alice Smith, Bob Jones\nThe participants discuss the week's news.".to_string(),
            ),
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    fn name(&self) -> &'static str {
        "stub-summarizer"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(answer) = self.queued.lock().unwrap().pop_front() {
            return Ok(answer);
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

/// How the stub translator answers a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TranslatorBehavior {
    #[default]
    Tag,
    Fail,
    /// Answers with one text fewer than requested.
    DropLast,
}

/// Translator that tags each text with the target language.
#[derive(Default)]
pub struct StubTranslator {
    pub behavior: Mutex<TranslatorBehavior>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Translator for StubTranslator {
    fn name(&self) -> &'static str {
        "stub-translator"
    }

    async fn translate(&self, _source: &str, target: &str, texts: &[String]) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tagged: Vec<String> = texts.iter().map(|t| format!("[{target}] {t}")).collect();
        match *self.behavior.lock().unwrap() {
            TranslatorBehavior::Tag => {}
            TranslatorBehavior::Fail => {
                return Err(Error::external("stub-translator", "HTTP 503: service unavailable"))
            }
            TranslatorBehavior::DropLast => {
                tagged.pop();
            }
        }
        Ok(tagged)
    }
}

/// Poster that records posts and can fail on a given call.
#[derive(Default)]
pub struct StubPoster {
    /// `(page_id, link, message)` of every successful post.
    pub posts: Mutex<Vec<(String, Option<String>, Option<String>)>>,
    /// Zero-based index of the call that fails, counted across the test.
    pub fail_on_call: Mutex<Option<usize>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SocialPoster for StubPoster {
    fn name(&self) -> &'static str {
        "stub-poster"
    }

    async fn post(
        &self,
        page_id: &str,
        link: Option<&str>,
        message: Option<&str>,
    ) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_on_call.lock().unwrap() == Some(call) {
            return Err(Error::external("stub-poster", "HTTP 500: try again later"));
        }

        let mut posts = self.posts.lock().unwrap();
        posts.push((
            page_id.to_string(),
            link.map(String::from),
            message.map(String::from),
        ));
        Ok(format!("{page_id}_{}", posts.len()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub db: DbPool,
    pub config: Config,
    pub metadata: Arc<StubMetadata>,
    pub captions: Arc<StubCaptions>,
    pub summarizer: Arc<StubSummarizer>,
    pub translator: Arc<StubTranslator>,
    pub poster: Arc<StubPoster>,
    /// Parent of every scratch workspace created by transcription.
    pub scratch: tempfile::TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let scratch = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.publisher.page_id = Some("page-1".into());
        config.publisher.disclaimer = "Generated automatically.".into();
        config.captions.pause_min_secs = 0;
        config.captions.pause_max_secs = 0;
        config.captions.scratch_dir = Some(scratch.path().to_path_buf());

        Self {
            db: init_memory_pool().unwrap(),
            config,
            metadata: Arc::new(StubMetadata::default()),
            captions: Arc::new(StubCaptions::default()),
            summarizer: Arc::new(StubSummarizer::default()),
            translator: Arc::new(StubTranslator::default()),
            poster: Arc::new(StubPoster::default()),
            scratch,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            metadata: self.metadata.clone(),
            captions: self.captions.clone(),
            summarizer: self.summarizer.clone(),
            translator: self.translator.clone(),
            poster: self.poster.clone(),
        }
    }

    pub fn worker(&self, kind: WorkerKind) -> Arc<dyn Worker> {
        build_worker(kind, &self.config, &self.db, &self.capabilities()).unwrap()
    }

    pub async fn run(&self, kind: WorkerKind) -> Result<CycleReport> {
        self.worker(kind).run_cycle(&CancellationToken::new()).await
    }

    /// Run every worker once, in pipeline order.
    pub async fn run_all(&self) {
        for kind in WorkerKind::ALL {
            self.run(kind).await.unwrap();
        }
    }

    pub fn add_channel(&self, id: &str, keywords: Option<&str>) -> Channel {
        let conn = get_conn(&self.db).unwrap();
        channels::create_channel(
            &conn,
            &NewChannel {
                id: id.into(),
                name: format!("Channel {id}"),
                url: format!("https://www.youtube.com/channel/{id}"),
                description: None,
                activity_level: 1,
                title_keywords: keywords.map(String::from),
            },
        )
        .unwrap()
    }

    pub fn channel(&self, id: &str) -> Channel {
        let conn = get_conn(&self.db).unwrap();
        channels::get_channel(&conn, id).unwrap().unwrap()
    }

    pub fn content(&self, video_id: &str) -> Option<ContentItem> {
        let conn = get_conn(&self.db).unwrap();
        contents::get_content_by_video_id(&conn, video_id).unwrap()
    }

    pub fn all_contents(&self) -> Vec<ContentItem> {
        let conn = get_conn(&self.db).unwrap();
        contents::list_contents(&conn, None, 0, 1000).unwrap()
    }

    /// Entries left in the scratch parent directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}
