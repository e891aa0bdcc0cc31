//! SQLite database module for reviews, upvotes and the follow graph
//!
//! ## Architecture
//!
//! - Repository modules (`reviews`, `upvotes`, `follows`, ...) are free
//!   functions over a borrowed `SqliteConnection`; they never open their own
//!   pool connection.
//! - [`SocialDb`] owns the r2d2 pool and decides transaction boundaries.
//!   Writes that read before they write run under `BEGIN IMMEDIATE`, so the
//!   whole sequence holds the SQLite write lock.
//!
//! ## Tables
//!
//! - `users`, `hikes` - mirrored catalog rows used for existence checks
//! - `reviews` - one row per (hike, author), with a cached `upvote_count`
//! - `review_upvotes` - (review, user) upvote edges
//! - `follows` - directed (follower, followed) edges

pub mod diesel_schema;
pub mod follows;
pub mod hikes;
pub mod models;
pub mod reviews;
pub mod schema;
pub mod upvotes;
pub mod users;

use std::path::Path;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::SocialError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database file name inside the storage directory
pub const DB_FILE_NAME: &str = "social.db";

// Row id of the last INSERT on this connection
diesel::define_sql_function! {
    fn last_insert_rowid() -> diesel::sql_types::BigInt;
}

/// Per-connection PRAGMAs applied whenever the pool opens a connection
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        );
        if self.wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pooled SQLite storage context shared by all services
pub struct SocialDb {
    pool: DbPool,
}

impl SocialDb {
    /// Open or create [`DB_FILE_NAME`] inside the storage directory
    pub fn open(storage_dir: &Path, pool_size: u32, busy_timeout_ms: u32) -> Result<Self, SocialError> {
        Self::open_at(&storage_dir.join(DB_FILE_NAME), pool_size, busy_timeout_ms)
    }

    /// Open or create a database file at an explicit path
    pub fn open_at(db_path: &Path, pool_size: u32, busy_timeout_ms: u32) -> Result<Self, SocialError> {
        info!("Opening SQLite database at {:?}", db_path);

        let url = db_path.to_string_lossy().to_string();
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout_ms,
                wal: true,
            }))
            .build(ConnectionManager::<SqliteConnection>::new(url))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub fn open_in_memory() -> Result<Self, SocialError> {
        debug!("Opening in-memory SQLite database");

        let pool = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout_ms: 0,
                wal: false,
            }))
            .build(ConnectionManager::<SqliteConnection>::new(":memory:"))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), SocialError> {
        let mut conn = self.pool.get()?;
        schema::init_schema(&mut conn)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> Result<DbConn, SocialError> {
        Ok(self.pool.get()?)
    }

    /// Run a read on one pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SocialError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, SocialError>,
    {
        let mut conn = self.conn()?;
        f(&mut conn)
    }

    /// Run several reads against one consistent snapshot
    pub fn with_read_tx<F, T>(&self, f: F) -> Result<T, SocialError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, SocialError>,
    {
        let mut pooled = self.conn()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.transaction(f)
    }

    /// Run `f` inside `BEGIN IMMEDIATE`; any error rolls everything back
    pub fn with_write_tx<F, T>(&self, f: F) -> Result<T, SocialError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, SocialError>,
    {
        let mut pooled = self.conn()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.immediate_transaction(f)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, SocialError> {
        use diesel_schema::{follows, review_upvotes, reviews};

        self.with_conn(|conn| {
            let review_count: i64 = reviews::table
                .count()
                .get_result(conn)
                .map_err(|e| SocialError::db("Count reviews", e))?;
            let upvote_count: i64 = review_upvotes::table
                .count()
                .get_result(conn)
                .map_err(|e| SocialError::db("Count upvotes", e))?;
            let follow_count: i64 = follows::table
                .count()
                .get_result(conn)
                .map_err(|e| SocialError::db("Count follows", e))?;

            Ok(DbStats {
                review_count: review_count as u64,
                upvote_count: upvote_count as u64,
                follow_count: follow_count as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub review_count: u64,
    pub upvote_count: u64,
    pub follow_count: u64,
}

// Re-exports
pub use models::{
    Follow, FollowEntry, Hike, Review, ReviewWithAuthor, ReviewWithHike, UpvoteOutcome, User,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tx_rolls_back_on_error() {
        let db = SocialDb::open_in_memory().unwrap();

        let result: Result<(), SocialError> = db.with_write_tx(|conn| {
            users::create_user(conn, "ghost")?;
            Err(SocialError::Internal("abort".into()))
        });
        assert!(result.is_err());

        let found = db
            .with_conn(|conn| users::find_user_by_username(conn, "ghost"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_stats_on_empty_db() {
        let db = SocialDb::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.review_count, 0);
        assert_eq!(stats.follow_count, 0);
    }
}
