//! Capability traits for the external services the workers talk to, and the
//! shared data types they return.
//!
//! Workers receive these as `Arc<dyn Trait>` at construction, so tests can
//! substitute in-memory stubs for every network dependency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tubedigest_common::{Result, Searchable};

// ---------------------------------------------------------------------------
// Video platform
// ---------------------------------------------------------------------------

/// One upload returned by a channel search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl Searchable for SearchHit {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Content details for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    /// ISO-8601 duration as reported by the platform (`PT1H2M3S`, `P0D`).
    pub duration: String,
    /// Full title; search snippets may be truncated.
    pub title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Snippet of a channel looked up by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDetails {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Handle such as `@somechannel`, when the channel has one.
    pub custom_url: Option<String>,
}

/// A channel returned by a free-text channel search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMatch {
    pub channel_id: String,
    pub title: String,
    pub description: Option<String>,
}

/// Read access to the video platform.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier (e.g. `"youtube"`).
    fn name(&self) -> &'static str;

    /// Uploads of `channel_id`, newest first.
    ///
    /// With `published_after` set, every upload published at or after that
    /// instant. Without it, a single page of the most recent uploads.
    async fn search(
        &self,
        channel_id: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchHit>>;

    /// Duration details for the given video ids. Unknown ids are omitted.
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>>;

    /// Snippet for a single channel id, `None` when it does not exist.
    async fn channel_details(&self, channel_id: &str) -> Result<Option<ChannelDetails>>;

    /// Channels matching a free-text query.
    async fn search_channels(&self, query: &str) -> Result<Vec<ChannelMatch>>;
}

// ---------------------------------------------------------------------------
// Language services
// ---------------------------------------------------------------------------

/// Chat-completion style text generator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one completion and return the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Batch text translation.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate every text from `source` to `target`.
    ///
    /// The result has exactly one entry per input, in input order.
    async fn translate(&self, source: &str, target: &str, texts: &[String]) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Social network
// ---------------------------------------------------------------------------

/// Publishes posts to a social page.
#[async_trait]
pub trait SocialPoster: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create a post on `page_id` and return the new post's id.
    ///
    /// At least one of `link` and `message` must be given.
    async fn post(&self, page_id: &str, link: Option<&str>, message: Option<&str>)
        -> Result<String>;
}
