//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use tubedigest_common::{Error, Result};

/// V1: initial schema -- channels, contents, features and their links.
const V1_INITIAL: &str = r#"
CREATE TABLE channels (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    url               TEXT NOT NULL,
    description       TEXT,
    activity_level    INTEGER NOT NULL DEFAULT 1,
    title_keywords    TEXT,
    last_published_at TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE contents (
    id                  TEXT PRIMARY KEY,
    video_id            TEXT UNIQUE NOT NULL,
    channel_id          TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
    title               TEXT NOT NULL,
    length_secs         INTEGER NOT NULL,
    published_at        TEXT NOT NULL,
    stage               TEXT NOT NULL DEFAULT 'discovered',
    raw_transcript      TEXT,
    filtered_transcript TEXT,
    summary_primary     TEXT,
    summary_translated  TEXT,
    additional_notes    TEXT,
    not_relevant        INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX idx_contents_stage   ON contents(stage, not_relevant);
CREATE INDEX idx_contents_channel ON contents(channel_id);

CREATE TABLE features (
    id               TEXT PRIMARY KEY,
    first_name_en    TEXT NOT NULL,
    last_name_en     TEXT NOT NULL,
    first_name_local TEXT,
    last_name_local  TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE content_features (
    content_id TEXT NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    feature_id TEXT NOT NULL REFERENCES features(id) ON DELETE CASCADE,
    PRIMARY KEY (content_id, feature_id)
);
"#;

/// V2: keep the social post id returned by publication.
const V2_POST_ID: &str = r#"
ALTER TABLE contents ADD COLUMN post_id TEXT;
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_POST_ID)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;

        tracing::debug!(version, "Applied migration");
    }

    Ok(())
}
