//! Database schema definitions

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use tracing::info;

use crate::error::SocialError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = Integer)]
    version: i32,
}

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), SocialError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.transaction(|conn| {
            create_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)
        })?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, SocialError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| SocialError::db("Create schema_version table", e))?;

    let row: Option<VersionRow> = diesel::sql_query("SELECT version FROM schema_version LIMIT 1")
        .get_result(conn)
        .optional()
        .map_err(|e| SocialError::db("Read schema_version", e))?;

    Ok(row.map(|r| r.version).unwrap_or(0))
}

/// Set schema version
fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), SocialError> {
    diesel::sql_query("DELETE FROM schema_version")
        .execute(conn)
        .map_err(|e| SocialError::db("Clear schema_version", e))?;
    diesel::sql_query("INSERT INTO schema_version (version) VALUES (?)")
        .bind::<Integer, _>(version)
        .execute(conn)
        .map_err(|e| SocialError::db("Set schema_version", e))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &mut SqliteConnection) -> Result<(), SocialError> {
    conn.batch_execute(CATALOG_SCHEMA)
        .map_err(|e| SocialError::db("Create catalog tables", e))?;

    conn.batch_execute(REVIEWS_SCHEMA)
        .map_err(|e| SocialError::db("Create review tables", e))?;

    conn.batch_execute(FOLLOWS_SCHEMA)
        .map_err(|e| SocialError::db("Create follow tables", e))?;

    conn.batch_execute(INDEXES_SCHEMA)
        .map_err(|e| SocialError::db("Create indexes", e))?;

    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &mut SqliteConnection, from_version: i32) -> Result<(), SocialError> {
    info!(from_version, "No migration steps registered");
    set_schema_version(conn, SCHEMA_VERSION)
}

/// Users and hikes are owned by the auth and catalog services; these tables
/// mirror just enough of them for existence checks and display names.
const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hikes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Reviews and their upvote edges
const REVIEWS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hike_id INTEGER NOT NULL REFERENCES hikes(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(id),
    rating_halves INTEGER NOT NULL CHECK (rating_halves BETWEEN 2 AND 10),
    body TEXT,
    upvote_count INTEGER NOT NULL DEFAULT 0 CHECK (upvote_count >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (hike_id, author_id)
);

CREATE TABLE IF NOT EXISTS review_upvotes (
    review_id INTEGER NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (review_id, user_id)
);
"#;

/// Directed follow edges
const FOLLOWS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS follows (
    follower_id INTEGER NOT NULL REFERENCES users(id),
    followed_id INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (follower_id, followed_id),
    CHECK (follower_id <> followed_id)
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_reviews_hike_rank
    ON reviews(hike_id, upvote_count DESC, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_reviews_author_created
    ON reviews(author_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_follows_followed
    ON follows(followed_id, created_at DESC);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        init_schema(&mut conn).unwrap();
        init_schema(&mut conn).unwrap();
        assert_eq!(get_schema_version(&mut conn).unwrap(), SCHEMA_VERSION);
    }
}
