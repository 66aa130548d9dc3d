//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tubedigest_common::{ContentId, FeatureId, Stage};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Canonical text form for stored timestamps (`2024-05-01T18:30:00Z`).
pub fn to_db_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in the stored text form.
pub fn db_now() -> String {
    to_db_time(&Utc::now())
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e))?;
    Ok(T::from(uuid))
}

fn parse_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn parse_opt_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|v| {
        DateTime::parse_from_rfc3339(&v)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

fn parse_stage(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Stage> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_err(idx, e))
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A curated source channel.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    /// Opaque external channel id.
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    /// `0` excludes the channel from discovery.
    pub activity_level: u8,
    /// Semicolon-delimited keyword filter.
    pub title_keywords: Option<String>,
    /// Watermark: latest publish time already discovered.
    pub last_published_at: Option<DateTime<Utc>>,
    pub created_at: String,
    pub updated_at: String,
}

impl Channel {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            description: row.get(3)?,
            activity_level: row.get(4)?,
            title_keywords: row.get(5)?,
            last_published_at: parse_opt_time(row, 6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

/// Input for creating a channel.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub activity_level: u8,
    pub title_keywords: Option<String>,
}

// ---------------------------------------------------------------------------
// ContentItem
// ---------------------------------------------------------------------------

/// One discovered video and everything the pipeline derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: ContentId,
    /// External video id, unique across the store.
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub length: Duration,
    pub published_at: DateTime<Utc>,
    pub stage: Stage,
    pub raw_transcript: Option<String>,
    pub filtered_transcript: Option<String>,
    pub summary_primary: Option<String>,
    pub summary_translated: Option<String>,
    /// Participant line split off the summarizer response.
    pub additional_notes: Option<String>,
    /// Administrative override; excluded from every stage when set.
    pub not_relevant: bool,
    pub post_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentItem {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let length_secs: i64 = row.get(4)?;
        Ok(Self {
            id: parse_id(row, 0)?,
            video_id: row.get(1)?,
            channel_id: row.get(2)?,
            title: row.get(3)?,
            length: Duration::from_secs(length_secs.max(0) as u64),
            published_at: parse_time(row, 5)?,
            stage: parse_stage(row, 6)?,
            raw_transcript: row.get(7)?,
            filtered_transcript: row.get(8)?,
            summary_primary: row.get(9)?,
            summary_translated: row.get(10)?,
            additional_notes: row.get(11)?,
            not_relevant: row.get(12)?,
            post_id: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    /// Whether publication has completed for this item.
    pub fn posted(&self) -> bool {
        self.stage == Stage::Published
    }

    /// Canonical watch URL on the source platform.
    pub fn source_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// A video accepted by discovery, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    pub video_id: String,
    pub title: String,
    pub length: Duration,
    pub published_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

/// A known participant that summaries can be attributed to.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub id: FeatureId,
    pub first_name_en: String,
    pub last_name_en: String,
    pub first_name_local: Option<String>,
    pub last_name_local: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Feature {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            first_name_en: row.get(1)?,
            last_name_en: row.get(2)?,
            first_name_local: row.get(3)?,
            last_name_local: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
