//! Follow graph storage using Diesel
//!
//! Edges are directed: (follower, followed). Nothing here ever reads or
//! writes the reverse edge implicitly. Counts are always computed live.

use diesel::prelude::*;

use super::diesel_schema::{follows, users};
use super::models::{current_timestamp, Follow, FollowEntry, NewFollow};
use crate::error::SocialError;

// ============================================================================
// Read Operations
// ============================================================================

/// Get the edge follower -> followed
pub fn get_follow(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<Option<Follow>, SocialError> {
    follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::followed_id.eq(followed_id))
        .select(Follow::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Whether `follower_id` follows `followed_id`
pub fn is_following(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, SocialError> {
    diesel::select(diesel::dsl::exists(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::followed_id.eq(followed_id)),
    ))
    .get_result(conn)
    .map_err(|e| SocialError::db("Query", e))
}

/// Users that `user_id` follows, most recent edge first
pub fn list_following(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<FollowEntry>, SocialError> {
    let rows: Vec<(i64, String, String)> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::followed_id)))
        .filter(follows::follower_id.eq(user_id))
        .order((follows::created_at.desc(), follows::followed_id.desc()))
        .select((users::id, users::username, follows::created_at))
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))?;

    Ok(rows.into_iter().map(into_entry).collect())
}

/// Users following `user_id`, most recent edge first
pub fn list_followers(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<FollowEntry>, SocialError> {
    let rows: Vec<(i64, String, String)> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::follower_id)))
        .filter(follows::followed_id.eq(user_id))
        .order((follows::created_at.desc(), follows::follower_id.desc()))
        .select((users::id, users::username, follows::created_at))
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))?;

    Ok(rows.into_iter().map(into_entry).collect())
}

fn into_entry((user_id, username, since): (i64, String, String)) -> FollowEntry {
    FollowEntry {
        user_id,
        username,
        since,
    }
}

/// Number of users `user_id` follows
pub fn count_following(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, SocialError> {
    follows::table
        .filter(follows::follower_id.eq(user_id))
        .count()
        .get_result(conn)
        .map_err(|e| SocialError::db("Count query", e))
}

/// Number of users following `user_id`
pub fn count_followers(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, SocialError> {
    follows::table
        .filter(follows::followed_id.eq(user_id))
        .count()
        .get_result(conn)
        .map_err(|e| SocialError::db("Count query", e))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Insert the edge follower -> followed
pub fn create_follow(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<Follow, SocialError> {
    let now = current_timestamp();
    diesel::insert_into(follows::table)
        .values(&NewFollow {
            follower_id,
            followed_id,
            created_at: &now,
        })
        .execute(conn)
        .map_err(|e| SocialError::db("Insert follow", e))?;

    get_follow(conn, follower_id, followed_id)?
        .ok_or_else(|| SocialError::Internal("Failed to retrieve created follow".into()))
}

/// Delete exactly the edge follower -> followed
pub fn delete_follow(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, SocialError> {
    let deleted = diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::followed_id.eq(followed_id)),
    )
    .execute(conn)
    .map_err(|e| SocialError::db("Delete follow", e))?;

    Ok(deleted > 0)
}
