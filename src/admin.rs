//! Administrative channel registration.
//!
//! Channels are resolved against the video platform before they are stored,
//! so the stored id is always the platform's canonical channel id.

use tubedigest_common::{Error, Result};
use tubedigest_db::models::{Channel, NewChannel};
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::channels;

use crate::providers::{ChannelMatch, MetadataProvider};

const CHANNEL_URL_BASE: &str = "https://www.youtube.com";

/// Per-channel discovery settings supplied by the operator.
#[derive(Debug, Clone, Default)]
pub struct ChannelOptions {
    /// `0` registers the channel without discovering it.
    pub activity_level: u8,
    /// Semicolon-delimited keyword filter.
    pub title_keywords: Option<String>,
}

/// Register a channel by its platform id.
pub async fn add_channel_by_id(
    db: &DbPool,
    metadata: &dyn MetadataProvider,
    channel_id: &str,
    options: ChannelOptions,
) -> Result<Channel> {
    ensure_absent(db, channel_id)?;

    let details = metadata
        .channel_details(channel_id)
        .await?
        .ok_or_else(|| Error::not_found("channel", channel_id))?;

    let url = match details.custom_url.as_deref().filter(|h| !h.is_empty()) {
        Some(handle) => format!("{CHANNEL_URL_BASE}/{handle}"),
        None => format!("{CHANNEL_URL_BASE}/channel/{}", details.id),
    };

    let conn = get_conn(db)?;
    channels::create_channel(
        &conn,
        &NewChannel {
            id: details.id,
            name: details.title,
            url,
            description: details.description,
            activity_level: options.activity_level,
            title_keywords: normalize_keywords(options.title_keywords),
        },
    )
}

/// Register a channel by its URL suffix (usually an `@handle`).
///
/// When the search returns several channels, `title` must name one of them
/// exactly.
pub async fn add_channel_by_suffix(
    db: &DbPool,
    metadata: &dyn MetadataProvider,
    suffix: &str,
    title: Option<&str>,
    options: ChannelOptions,
) -> Result<Channel> {
    let suffix = suffix.trim().trim_start_matches('/');
    if suffix.is_empty() {
        return Err(Error::Validation("channel suffix is empty".into()));
    }

    let matches = metadata.search_channels(suffix).await?;
    let chosen = pick_channel(matches, suffix, title)?;
    ensure_absent(db, &chosen.channel_id)?;

    let conn = get_conn(db)?;
    channels::create_channel(
        &conn,
        &NewChannel {
            id: chosen.channel_id,
            name: chosen.title,
            url: format!("{CHANNEL_URL_BASE}/{suffix}"),
            description: chosen.description,
            activity_level: options.activity_level,
            title_keywords: normalize_keywords(options.title_keywords),
        },
    )
}

fn ensure_absent(db: &DbPool, channel_id: &str) -> Result<()> {
    let conn = get_conn(db)?;
    if channels::get_channel(&conn, channel_id)?.is_some() {
        return Err(Error::Conflict(format!("channel {channel_id} already exists")));
    }
    Ok(())
}

/// Choose the single channel a suffix search refers to.
fn pick_channel(
    mut matches: Vec<ChannelMatch>,
    suffix: &str,
    title: Option<&str>,
) -> Result<ChannelMatch> {
    match (matches.len(), title) {
        (0, _) => Err(Error::not_found("channel", suffix)),
        (1, _) => Ok(matches.remove(0)),
        (n, None) => Err(Error::Validation(format!(
            "{n} channels match '{suffix}', provide a title to choose one"
        ))),
        (_, Some(title)) => matches
            .into_iter()
            .find(|m| m.title == title)
            .ok_or_else(|| Error::not_found("channel", format!("{suffix} titled '{title}'"))),
    }
}

fn normalize_keywords(keywords: Option<String>) -> Option<String> {
    keywords
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
