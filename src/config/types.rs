use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub publisher: PublisherConfig,

    #[serde(default)]
    pub captions: CaptionsConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file path (tilde-expanded)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum open connections; five workers plus one admin command
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Milliseconds a writer waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> String {
    "tubedigest.db".to_string()
}

fn default_pool_size() -> u32 {
    6
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> tubedigest_db::pool::PoolSettings {
        tubedigest_db::pool::PoolSettings {
            max_size: self.pool_size,
            busy_timeout: std::time::Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_youtube_url")]
    pub base_url: String,

    /// Results requested for a channel that has never been discovered
    #[serde(default = "default_recent_page_size")]
    pub recent_page_size: u32,

    /// Videos must be strictly longer than this to be kept
    #[serde(default = "default_min_length_secs")]
    pub min_length_secs: u64,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_youtube_url() -> String {
    "https://youtube.googleapis.com/youtube/v3".to_string()
}
fn default_recent_page_size() -> u32 {
    25
}
fn default_min_length_secs() -> u64 {
    30 * 60
}
fn default_requests_per_second() -> u32 {
    5
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_url(),
            recent_page_size: default_recent_page_size(),
            min_length_secs: default_min_length_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    /// OpenAI-compatible API root, e.g. `http://localhost:1234/v1` for LM Studio
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Local models can take a long time on a full transcript
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "meta-llama-3.1-8b-instruct".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_summarizer_timeout() -> u64 {
    40 * 60
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_summarizer_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Azure resource region, required for regional and multi-service keys
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_source_language")]
    pub source_language: String,

    #[serde(default = "default_target_language")]
    pub target_language: String,
}

fn default_translator_endpoint() -> String {
    "https://api.cognitive.microsofttranslator.com".to_string()
}
fn default_source_language() -> String {
    "en".to_string()
}
fn default_target_language() -> String {
    "ka".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            api_key: None,
            region: None,
            source_language: default_source_language(),
            target_language: default_target_language(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    #[serde(default)]
    pub page_id: Option<String>,

    /// Page access token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Appended to every post after a blank line
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
}

fn default_graph_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}
fn default_disclaimer() -> String {
    "This summary was generated automatically and may contain inaccuracies.".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            graph_url: default_graph_url(),
            page_id: None,
            access_token: None,
            disclaimer: default_disclaimer(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptionsConfig {
    /// Custom yt-dlp path (uses PATH if not set)
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    #[serde(default = "default_caption_language")]
    pub language: String,

    #[serde(default = "default_caption_timeout")]
    pub timeout_secs: u64,

    /// Randomized pause between downloads, lower bound
    #[serde(default = "default_pause_min")]
    pub pause_min_secs: u64,

    /// Randomized pause between downloads, upper bound
    #[serde(default = "default_pause_max")]
    pub pause_max_secs: u64,

    /// Parent directory for scratch workspaces (system temp dir if not set)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_caption_language() -> String {
    "en".to_string()
}
fn default_caption_timeout() -> u64 {
    600
}
fn default_pause_min() -> u64 {
    50
}
fn default_pause_max() -> u64 {
    70
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            language: default_caption_language(),
            timeout_secs: default_caption_timeout(),
            pause_min_secs: default_pause_min(),
            pause_max_secs: default_pause_max(),
            scratch_dir: None,
        }
    }
}

/// Worker intervals in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_discovery_secs")]
    pub discovery_secs: u64,

    #[serde(default = "default_transcription_secs")]
    pub transcription_secs: u64,

    #[serde(default = "default_summarization_secs")]
    pub summarization_secs: u64,

    #[serde(default = "default_translation_secs")]
    pub translation_secs: u64,

    #[serde(default = "default_publication_secs")]
    pub publication_secs: u64,
}

fn default_discovery_secs() -> u64 {
    60 * 60
}
fn default_transcription_secs() -> u64 {
    30 * 60
}
fn default_summarization_secs() -> u64 {
    30 * 60
}
fn default_translation_secs() -> u64 {
    10 * 60
}
fn default_publication_secs() -> u64 {
    5 * 60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            discovery_secs: default_discovery_secs(),
            transcription_secs: default_transcription_secs(),
            summarization_secs: default_summarization_secs(),
            translation_secs: default_translation_secs(),
            publication_secs: default_publication_secs(),
        }
    }
}

impl Config {
    /// Check that every credential and endpoint the workers need is present.
    ///
    /// All missing entries are reported together in one
    /// [`tubedigest_common::Error::Config`].
    pub fn require_credentials(&self) -> tubedigest_common::Result<()> {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map_or(true, |s| s.trim().is_empty())
        }

        let mut missing = Vec::new();
        if blank(&self.youtube.api_key) {
            missing.push("youtube.api_key");
        }
        if blank(&self.summarizer.base_url) {
            missing.push("summarizer.base_url");
        }
        if self.translator.endpoint.trim().is_empty() {
            missing.push("translator.endpoint");
        }
        if blank(&self.translator.api_key) {
            missing.push("translator.api_key");
        }
        if blank(&self.publisher.page_id) {
            missing.push("publisher.page_id");
        }
        if blank(&self.publisher.access_token) {
            missing.push("publisher.access_token");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(tubedigest_common::Error::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}
