//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Current UTC timestamp as an RFC 3339 string with millisecond precision.
/// Fixed width, so TEXT ordering matches chronological ordering.
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ============================================================================
// Ratings (stored as whole half-stars)
// ============================================================================

pub mod ratings {
    use crate::error::SocialError;

    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    /// Tolerance applied to `rating * 2` when checking for a half-star step
    pub const STEP_TOLERANCE: f64 = 1e-4;

    /// Validate a rating and convert it to its half-star count (2..=10)
    pub fn to_halves(rating: f64) -> Result<i32, SocialError> {
        if !rating.is_finite() {
            return Err(SocialError::InvalidArgument("Rating must be a number".into()));
        }
        if rating < MIN || rating > MAX {
            return Err(SocialError::InvalidArgument(format!(
                "Rating must be between {:.1} and {:.1}, got {}",
                MIN, MAX, rating
            )));
        }

        let doubled = rating * 2.0;
        if (doubled - doubled.round()).abs() >= STEP_TOLERANCE {
            return Err(SocialError::InvalidArgument(format!(
                "Rating must be in 0.5 increments (1.0, 1.5, ..., 5.0), got {}",
                rating
            )));
        }

        Ok(doubled.round() as i32)
    }

    pub fn from_halves(halves: i32) -> f64 {
        f64::from(halves) / 2.0
    }

    pub fn is_valid(rating: f64) -> bool {
        to_halves(rating).is_ok()
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub created_at: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = hikes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Hike {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = hikes)]
pub struct NewHike<'a> {
    pub name: &'a str,
    pub created_at: &'a str,
}

// ============================================================================
// Review Models
// ============================================================================

/// Review row from SELECT query
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Review {
    pub id: i64,
    pub hike_id: i64,
    pub author_id: i64,
    pub rating_halves: i32,
    pub body: Option<String>,
    pub upvote_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Review {
    pub fn rating(&self) -> f64 {
        ratings::from_halves(self.rating_halves)
    }
}

/// New review for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview<'a> {
    pub hike_id: i64,
    pub author_id: i64,
    pub rating_halves: i32,
    pub body: Option<&'a str>,
    pub upvote_count: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Review joined with its author's username
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author_username: String,
}

/// Review joined with the hike it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithHike {
    pub review: Review,
    pub hike: Hike,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = review_upvotes)]
pub struct NewReviewUpvote<'a> {
    pub review_id: i64,
    pub user_id: i64,
    pub created_at: &'a str,
}

/// Result of an upvote mutation, relative to the calling user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpvoteOutcome {
    pub review_id: i64,
    pub upvote_count: i32,
    pub upvoted: bool,
}

// ============================================================================
// Follow Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Follow {
    pub follower_id: i64,
    pub followed_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow<'a> {
    pub follower_id: i64,
    pub followed_id: i64,
    pub created_at: &'a str,
}

/// The user on the other end of a follow edge, with the edge's timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowEntry {
    pub user_id: i64,
    pub username: String,
    pub since: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_half_step_is_accepted() {
        let mut expected = 2;
        let mut rating = 1.0;
        while rating <= 5.0 {
            assert_eq!(ratings::to_halves(rating).unwrap(), expected);
            rating += 0.5;
            expected += 1;
        }
    }

    #[test]
    fn test_off_step_and_out_of_range_rejected() {
        assert!(!ratings::is_valid(4.3));
        assert!(!ratings::is_valid(0.5));
        assert!(!ratings::is_valid(5.5));
        assert!(!ratings::is_valid(f64::NAN));
        assert!(ratings::is_valid(4.50001));
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        let a = current_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = current_timestamp();
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
