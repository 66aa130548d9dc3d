//! Content item operations.
//!
//! Reads are scoped to a single [`Stage`]. Every write that advances an item
//! is guarded by the stage it expects the item to be in, so a stale or
//! overlapping write matches zero rows instead of regressing the item.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tubedigest_common::{ContentId, Error, FeatureId, Result, Stage};

use crate::models::{db_now, to_db_time, ContentItem, NewContent};
use crate::queries::features::link_feature;

const COLS: &str = "id, video_id, channel_id, title, length_secs, published_at, stage,
    raw_transcript, filtered_transcript, summary_primary, summary_translated,
    additional_notes, not_relevant, post_id, created_at, updated_at";

/// Result of persisting one channel's discovery batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryCommit {
    /// Rows actually inserted; duplicates of known video ids are skipped.
    pub inserted: usize,
    /// The channel watermark after the commit.
    pub watermark: Option<DateTime<Utc>>,
}

/// Persist a channel's newly discovered videos and advance its watermark.
///
/// Runs in one transaction: each item is inserted only if its video id is
/// unknown, then the watermark moves to the latest `published_at` among the
/// rows actually inserted. It never moves backward. If any statement fails
/// nothing is committed.
pub fn commit_discovery(
    conn: &Connection,
    channel_id: &str,
    items: &[NewContent],
) -> Result<DiscoveryCommit> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let now = db_now();

    let current: Option<String> = match tx.query_row(
        "SELECT last_published_at FROM channels WHERE id = ?1",
        [channel_id],
        |row| row.get(0),
    ) {
        Ok(v) => v,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(Error::not_found("channel", channel_id))
        }
        Err(e) => return Err(Error::database(e.to_string())),
    };
    let mut watermark = current
        .as_deref()
        .map(DateTime::parse_from_rfc3339)
        .transpose()
        .map_err(|e| Error::database(format!("corrupt watermark for {channel_id}: {e}")))?
        .map(|t| t.with_timezone(&Utc));

    let mut inserted = 0usize;
    for item in items {
        let n = tx
            .execute(
                "INSERT OR IGNORE INTO contents
                    (id, video_id, channel_id, title, length_secs, published_at, stage,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'discovered', ?7, ?7)",
                rusqlite::params![
                    ContentId::new().to_string(),
                    item.video_id,
                    channel_id,
                    item.title,
                    item.length.as_secs() as i64,
                    to_db_time(&item.published_at),
                    &now,
                ],
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if n > 0 {
            inserted += 1;
            if watermark.map_or(true, |w| item.published_at > w) {
                watermark = Some(item.published_at);
            }
        }
    }

    let advanced = watermark.map(|w| to_db_time(&w));
    if advanced != current {
        tx.execute(
            "UPDATE channels SET last_published_at = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![advanced, &now, channel_id],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(DiscoveryCommit {
        inserted,
        watermark,
    })
}

/// Get a content item by its surrogate id.
pub fn get_content(conn: &Connection, id: ContentId) -> Result<Option<ContentItem>> {
    let q = format!("SELECT {COLS} FROM contents WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], ContentItem::from_row) {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a content item by its external video id.
pub fn get_content_by_video_id(conn: &Connection, video_id: &str) -> Result<Option<ContentItem>> {
    let q = format!("SELECT {COLS} FROM contents WHERE video_id = ?1");
    match conn.query_row(&q, [video_id], ContentItem::from_row) {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Items ready for the worker that consumes `stage`, oldest first.
///
/// Items flagged `not_relevant` are never returned. `limit` of `None` returns
/// the whole readiness set.
pub fn list_ready(conn: &Connection, stage: Stage, limit: Option<i64>) -> Result<Vec<ContentItem>> {
    let q = format!(
        "SELECT {COLS} FROM contents WHERE stage = ?1 AND not_relevant = 0
         ORDER BY published_at ASC, created_at ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(
            rusqlite::params![stage.as_str(), limit.unwrap_or(-1)],
            ContentItem::from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List items with an optional stage filter and pagination, newest first.
pub fn list_contents(
    conn: &Connection,
    stage: Option<Stage>,
    offset: i64,
    limit: i64,
) -> Result<Vec<ContentItem>> {
    let q = format!(
        "SELECT {COLS} FROM contents WHERE (?1 IS NULL OR stage = ?1)
         ORDER BY published_at DESC LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(
            rusqlite::params![stage.map(|s| s.as_str()), limit, offset],
            ContentItem::from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Number of relevant items in each stage, in pipeline order.
pub fn count_by_stage(conn: &Connection) -> Result<Vec<(Stage, i64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT stage, COUNT(*) FROM contents WHERE not_relevant = 0 GROUP BY stage",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut counts: Vec<(Stage, i64)> = Stage::ALL.iter().map(|s| (*s, 0)).collect();
    for (name, n) in rows {
        let stage: Stage = name.parse()?;
        if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == stage) {
            entry.1 = n;
        }
    }
    Ok(counts)
}

/// Store both transcripts and advance `Discovered -> Transcribed`.
///
/// Returns `false` if the item was no longer waiting for captions.
pub fn record_transcript(
    conn: &Connection,
    id: ContentId,
    raw: &str,
    filtered: &str,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE contents SET raw_transcript = ?1, filtered_transcript = ?2,
                stage = 'transcribed', updated_at = ?3
             WHERE id = ?4 AND stage = 'discovered' AND not_relevant = 0",
            rusqlite::params![raw, filtered, db_now(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Store the summary, the participant notes and the feature links together,
/// advancing `Transcribed -> Summarized`.
///
/// Links that already exist are skipped. Returns `false` (and writes nothing)
/// if the item was no longer waiting for a summary.
pub fn record_summary(
    conn: &Connection,
    id: ContentId,
    summary: &str,
    notes: Option<&str>,
    features: &[FeatureId],
) -> Result<bool> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let n = tx
        .execute(
            "UPDATE contents SET summary_primary = ?1, additional_notes = ?2,
                stage = 'summarized', updated_at = ?3
             WHERE id = ?4 AND stage = 'transcribed' AND not_relevant = 0",
            rusqlite::params![summary, notes, db_now(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    if n == 0 {
        return Ok(false);
    }

    for feature in features {
        link_feature(&tx, id, *feature)?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(true)
}

/// Store a batch of translated summaries in one transaction, advancing each
/// item `Summarized -> Translated`.
///
/// Returns how many items advanced.
pub fn record_translations(conn: &Connection, batch: &[(ContentId, String)]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let now = db_now();

    let mut advanced = 0;
    for (id, translated) in batch {
        advanced += tx
            .execute(
                "UPDATE contents SET summary_translated = ?1, stage = 'translated',
                    updated_at = ?2
                 WHERE id = ?3 AND stage = 'summarized' AND not_relevant = 0",
                rusqlite::params![translated, &now, id.to_string()],
            )
            .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(advanced)
}

/// Mark a batch of items as posted in one transaction, advancing each item
/// `Translated -> Published` and keeping the returned post id.
///
/// Returns how many items advanced.
pub fn mark_published(conn: &Connection, batch: &[(ContentId, String)]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    let now = db_now();

    let mut advanced = 0;
    for (id, post_id) in batch {
        advanced += tx
            .execute(
                "UPDATE contents SET post_id = ?1, stage = 'published', updated_at = ?2
                 WHERE id = ?3 AND stage = 'translated'",
                rusqlite::params![post_id, &now, id.to_string()],
            )
            .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(advanced)
}

/// Set or clear the administrative not-relevant override.
pub fn set_not_relevant(conn: &Connection, video_id: &str, not_relevant: bool) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE contents SET not_relevant = ?1, updated_at = ?2 WHERE video_id = ?3",
            rusqlite::params![not_relevant, db_now(), video_id],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
