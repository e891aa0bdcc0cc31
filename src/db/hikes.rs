//! Hike catalog lookups
//!
//! The catalog itself lives elsewhere; reviews only need to know that a
//! hike exists and what it is called.

use diesel::prelude::*;

use super::diesel_schema::hikes;
use super::last_insert_rowid;
use super::models::{current_timestamp, Hike, NewHike};
use crate::error::SocialError;

/// Get hike by ID
pub fn get_hike(conn: &mut SqliteConnection, hike_id: i64) -> Result<Option<Hike>, SocialError> {
    hikes::table
        .filter(hikes::id.eq(hike_id))
        .select(Hike::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Get hike by ID, failing with `NotFound` when absent
pub fn require_hike(conn: &mut SqliteConnection, hike_id: i64) -> Result<Hike, SocialError> {
    get_hike(conn, hike_id)?
        .ok_or_else(|| SocialError::NotFound(format!("Hike not found with id: {}", hike_id)))
}

/// Insert a hike mirror row
pub fn create_hike(conn: &mut SqliteConnection, name: &str) -> Result<Hike, SocialError> {
    if name.trim().is_empty() {
        return Err(SocialError::InvalidArgument("hike name is required".into()));
    }

    let now = current_timestamp();
    diesel::insert_into(hikes::table)
        .values(&NewHike {
            name,
            created_at: &now,
        })
        .execute(conn)
        .map_err(|e| SocialError::db("Insert hike", e))?;

    let id: i64 = diesel::select(last_insert_rowid())
        .get_result(conn)
        .map_err(|e| SocialError::db("Read hike id", e))?;

    require_hike(conn, id)
}

/// Delete a hike; its reviews and their upvotes go with it
pub fn delete_hike(conn: &mut SqliteConnection, hike_id: i64) -> Result<bool, SocialError> {
    let deleted = diesel::delete(hikes::table.filter(hikes::id.eq(hike_id)))
        .execute(conn)
        .map_err(|e| SocialError::db("Delete hike", e))?;

    Ok(deleted > 0)
}
