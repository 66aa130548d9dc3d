//! Channel CRUD and discovery selection.

use rusqlite::{Connection, ErrorCode};
use tubedigest_common::{Error, Result};

use crate::models::{db_now, Channel, NewChannel};

const COLS: &str = "id, name, url, description, activity_level, title_keywords,
    last_published_at, created_at, updated_at";

/// Create a channel. Fails with [`Error::Conflict`] if the id already exists.
pub fn create_channel(conn: &Connection, new: &NewChannel) -> Result<Channel> {
    let now = db_now();

    conn.execute(
        "INSERT INTO channels (id, name, url, description, activity_level, title_keywords,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            new.id,
            new.name,
            new.url,
            new.description,
            new.activity_level,
            new.title_keywords,
            &now
        ],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            Error::Conflict(format!("channel {} already exists", new.id))
        }
        _ => Error::database(e.to_string()),
    })?;

    Ok(Channel {
        id: new.id.clone(),
        name: new.name.clone(),
        url: new.url.clone(),
        description: new.description.clone(),
        activity_level: new.activity_level,
        title_keywords: new.title_keywords.clone(),
        last_published_at: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a channel by its external id.
pub fn get_channel(conn: &Connection, id: &str) -> Result<Option<Channel>> {
    let q = format!("SELECT {COLS} FROM channels WHERE id = ?1");
    match conn.query_row(&q, [id], Channel::from_row) {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all channels ordered by name.
pub fn list_channels(conn: &Connection) -> Result<Vec<Channel>> {
    query_channels(conn, &format!("SELECT {COLS} FROM channels ORDER BY name ASC"))
}

/// List the channels discovery should visit (`activity_level > 0`).
pub fn list_active_channels(conn: &Connection) -> Result<Vec<Channel>> {
    query_channels(
        conn,
        &format!("SELECT {COLS} FROM channels WHERE activity_level > 0 ORDER BY name ASC"),
    )
}

fn query_channels(conn: &Connection, q: &str) -> Result<Vec<Channel>> {
    let mut stmt = conn.prepare(q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Channel::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update the administrative fields of a channel. The watermark is untouched.
pub fn update_channel(
    conn: &Connection,
    id: &str,
    name: &str,
    activity_level: u8,
    title_keywords: Option<&str>,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE channels SET name = ?1, activity_level = ?2, title_keywords = ?3,
                updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![name, activity_level, title_keywords, db_now(), id],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a channel together with its content items.
pub fn delete_channel(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM channels WHERE id = ?1", [id])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
