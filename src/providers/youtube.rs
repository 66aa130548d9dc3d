//! YouTube Data API v3 client.
//!
//! Implements [`MetadataProvider`] with:
//! - Token-bucket rate limiting via [`governor`].
//! - Retry on HTTP 429 honouring `Retry-After` (max 3 retries).
//! - Pagination of incremental searches through `nextPageToken`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use tubedigest_common::{Error, Result};

use super::capability::{ChannelDetails, ChannelMatch, MetadataProvider, SearchHit, VideoDetails};
use super::http::{build_client, decode, ensure_success, retry_after, transport};
use crate::config::YoutubeConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SERVICE: &str = "youtube";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
/// API maximum for `maxResults` and for ids per `videos` call.
const MAX_PAGE_SIZE: usize = 50;
/// Upper bound on pages followed for one incremental search. Hitting it
/// fails the search so the channel watermark stays where it was.
const MAX_PAGES: usize = 20;

// ---------------------------------------------------------------------------
// API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<T> {
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoSearchItem {
    id: VideoRef,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    /// Absent for channel and playlist results.
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelSearchItem {
    id: ChannelRef,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRef {
    channel_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    published_at: DateTime<Utc>,
    title: String,
    #[serde(default)]
    description: String,
    custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: ContentDetails,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: Snippet,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// YouTube metadata client.
///
/// # Examples
///
/// ```no_run
/// use tubedigest::providers::YoutubeClient;
///
/// let client = YoutubeClient::new("api-key".into(), "https://youtube.googleapis.com/youtube/v3".into())?;
/// # Ok::<(), tubedigest_common::Error>(())
/// ```
pub struct YoutubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    recent_page_size: u32,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl YoutubeClient {
    /// Create a client with default page size and 5 requests per second.
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            recent_page_size: 25,
            rate_limiter: limiter(5),
        })
    }

    pub fn from_config(config: &YoutubeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("youtube.api_key is not set".into()))?;
        Ok(Self::new(api_key, config.base_url.clone())?
            .with_recent_page_size(config.recent_page_size)
            .with_rate_limit(config.requests_per_second))
    }

    pub fn with_recent_page_size(mut self, size: u32) -> Self {
        self.recent_page_size = size.clamp(1, MAX_PAGE_SIZE as u32);
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limiter = limiter(per_second);
        self
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(&url)
                .query(&[("key", self.api_key.as_str())])
                .query(params)
                .send()
                .await
                .map_err(|e| transport(SERVICE, e))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = retry_after(&resp).unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "YouTube returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return ensure_success(SERVICE, resp).await;
        }
    }
}

fn limiter(
    per_second: u32,
) -> RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>
{
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// `publishedAfter` wants RFC 3339 with a literal `Z`.
fn rfc3339_z(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[async_trait]
impl MetadataProvider for YoutubeClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn search(
        &self,
        channel_id: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchHit>> {
        let after = published_after.map(|t| rfc3339_z(&t));
        let page_size = match after {
            Some(_) => MAX_PAGE_SIZE.to_string(),
            None => self.recent_page_size.to_string(),
        };

        let mut hits = Vec::new();
        let mut page_token: Option<String> = None;

        let mut page = 0;
        loop {
            let mut params = vec![
                ("channelId", channel_id),
                ("part", "snippet"),
                ("order", "date"),
                ("type", "video"),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(after) = after.as_deref() {
                params.push(("publishedAfter", after));
            }
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            debug!(channel_id, page, published_after = ?after, "YouTube search");
            let body: SearchResponse<VideoSearchItem> =
                decode(SERVICE, self.get("search", &params).await?).await?;

            hits.extend(body.items.into_iter().filter_map(|item| {
                Some(SearchHit {
                    video_id: item.id.video_id?,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    published_at: item.snippet.published_at,
                })
            }));

            // A first-time channel only gets the most recent page.
            if after.is_none() {
                break;
            }
            match body.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }

            page += 1;
            if page == MAX_PAGES {
                warn!(channel_id, pages = page, "Search results still paging, giving up");
                return Err(Error::external(
                    SERVICE,
                    format!(
                        "channel {channel_id} has more than {MAX_PAGES} result pages after {}",
                        after.as_deref().unwrap_or_default()
                    ),
                ));
            }
        }

        Ok(hits)
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
        let mut details = Vec::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(MAX_PAGE_SIZE) {
            let ids = chunk.join(",");
            let body: ListResponse<VideoItem> = decode(
                SERVICE,
                self.get(
                    "videos",
                    &[("id", ids.as_str()), ("part", "contentDetails,snippet")],
                )
                .await?,
            )
            .await?;

            details.extend(body.items.into_iter().map(|item| {
                let (title, published_at) = match item.snippet {
                    Some(s) => (Some(s.title), Some(s.published_at)),
                    None => (None, None),
                };
                VideoDetails {
                    id: item.id,
                    duration: item.content_details.duration,
                    title,
                    published_at,
                }
            }));
        }

        Ok(details)
    }

    async fn channel_details(&self, channel_id: &str) -> Result<Option<ChannelDetails>> {
        let body: ListResponse<ChannelItem> = decode(
            SERVICE,
            self.get("channels", &[("id", channel_id), ("part", "snippet")])
                .await?,
        )
        .await?;

        Ok(body.items.into_iter().next().map(|item| ChannelDetails {
            id: item.id,
            title: item.snippet.title,
            description: Some(item.snippet.description).filter(|d| !d.is_empty()),
            custom_url: item.snippet.custom_url,
        }))
    }

    async fn search_channels(&self, query: &str) -> Result<Vec<ChannelMatch>> {
        let body: SearchResponse<ChannelSearchItem> = decode(
            SERVICE,
            self.get(
                "search",
                &[("q", query), ("part", "snippet"), ("type", "channel")],
            )
            .await?,
        )
        .await?;

        Ok(body
            .items
            .into_iter()
            .map(|item| ChannelMatch {
                channel_id: item.id.channel_id,
                title: item.snippet.title,
                description: Some(item.snippet.description).filter(|d| !d.is_empty()),
            })
            .collect())
    }
}
