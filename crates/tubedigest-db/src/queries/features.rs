//! Feature (known participant) operations and content links.

use rusqlite::Connection;
use tubedigest_common::{ContentId, Error, FeatureId, Result};

use crate::models::{db_now, Feature};

const COLS: &str = "id, first_name_en, last_name_en, first_name_local, last_name_local,
    created_at, updated_at";

/// Create a feature.
pub fn create_feature(
    conn: &Connection,
    first_name_en: &str,
    last_name_en: &str,
    first_name_local: Option<&str>,
    last_name_local: Option<&str>,
) -> Result<Feature> {
    let id = FeatureId::new();
    let now = db_now();

    conn.execute(
        "INSERT INTO features (id, first_name_en, last_name_en, first_name_local,
                               last_name_local, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        rusqlite::params![
            id.to_string(),
            first_name_en,
            last_name_en,
            first_name_local,
            last_name_local,
            &now
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Feature {
        id,
        first_name_en: first_name_en.to_string(),
        last_name_en: last_name_en.to_string(),
        first_name_local: first_name_local.map(String::from),
        last_name_local: last_name_local.map(String::from),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a feature by ID.
pub fn get_feature(conn: &Connection, id: FeatureId) -> Result<Option<Feature>> {
    let q = format!("SELECT {COLS} FROM features WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Feature::from_row) {
        Ok(f) => Ok(Some(f)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all features ordered by English last name.
pub fn list_features(conn: &Connection) -> Result<Vec<Feature>> {
    let q = format!("SELECT {COLS} FROM features ORDER BY last_name_en ASC, first_name_en ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Feature::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update a feature's names.
pub fn update_feature(
    conn: &Connection,
    id: FeatureId,
    first_name_en: &str,
    last_name_en: &str,
    first_name_local: Option<&str>,
    last_name_local: Option<&str>,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE features SET first_name_en = ?1, last_name_en = ?2, first_name_local = ?3,
                last_name_local = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                first_name_en,
                last_name_en,
                first_name_local,
                last_name_local,
                db_now(),
                id.to_string()
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a feature and its content links.
pub fn delete_feature(conn: &Connection, id: FeatureId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM features WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Link a content item to a feature. Existing links are left alone.
///
/// Returns `true` if a new link was created.
pub fn link_feature(conn: &Connection, content_id: ContentId, feature_id: FeatureId) -> Result<bool> {
    let n = conn
        .execute(
            "INSERT OR IGNORE INTO content_features (content_id, feature_id) VALUES (?1, ?2)",
            rusqlite::params![content_id.to_string(), feature_id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Features linked to a content item.
pub fn features_for_content(conn: &Connection, content_id: ContentId) -> Result<Vec<Feature>> {
    let q = "SELECT f.id, f.first_name_en, f.last_name_en, f.first_name_local,
                    f.last_name_local, f.created_at, f.updated_at
             FROM features f
             JOIN content_features cf ON cf.feature_id = f.id
             WHERE cf.content_id = ?1
             ORDER BY f.last_name_en ASC";
    let mut stmt = conn.prepare(q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([content_id.to_string()], Feature::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
