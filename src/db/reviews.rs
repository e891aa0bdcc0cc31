//! Review CRUD operations using Diesel
//!
//! One review per (hike, author). Callers run `upsert_review` inside a
//! write transaction; the UNIQUE(hike_id, author_id) index backs it up.

use diesel::prelude::*;

use super::diesel_schema::{hikes, reviews, users};
use super::models::{
    current_timestamp, Hike, NewReview, Review, ReviewWithAuthor, ReviewWithHike,
};
use crate::error::SocialError;

/// Count and rating sum for one hike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub total_reviews: i64,
    pub average_rating: f64,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get review by ID
pub fn get_review(conn: &mut SqliteConnection, review_id: i64) -> Result<Option<Review>, SocialError> {
    reviews::table
        .filter(reviews::id.eq(review_id))
        .select(Review::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Get review by ID, failing with `NotFound` when absent
pub fn require_review(conn: &mut SqliteConnection, review_id: i64) -> Result<Review, SocialError> {
    get_review(conn, review_id)?
        .ok_or_else(|| SocialError::NotFound(format!("Review not found with id: {}", review_id)))
}

/// Find the author's review of a hike, if any
pub fn find_review(
    conn: &mut SqliteConnection,
    hike_id: i64,
    author_id: i64,
) -> Result<Option<Review>, SocialError> {
    reviews::table
        .filter(reviews::hike_id.eq(hike_id))
        .filter(reviews::author_id.eq(author_id))
        .select(Review::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Reviews for a hike, most upvoted first, then newest, then highest id
pub fn list_reviews_for_hike(
    conn: &mut SqliteConnection,
    hike_id: i64,
) -> Result<Vec<ReviewWithAuthor>, SocialError> {
    let rows: Vec<(Review, String)> = reviews::table
        .inner_join(users::table)
        .filter(reviews::hike_id.eq(hike_id))
        .order((
            reviews::upvote_count.desc(),
            reviews::created_at.desc(),
            reviews::id.desc(),
        ))
        .select((Review::as_select(), users::username))
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))?;

    Ok(rows
        .into_iter()
        .map(|(review, author_username)| ReviewWithAuthor {
            review,
            author_username,
        })
        .collect())
}

/// An author's reviews with their hikes, newest first
pub fn list_reviews_by_author(
    conn: &mut SqliteConnection,
    author_id: i64,
    limit: i64,
) -> Result<Vec<ReviewWithHike>, SocialError> {
    let rows: Vec<(Review, Hike)> = reviews::table
        .inner_join(hikes::table)
        .filter(reviews::author_id.eq(author_id))
        .order((reviews::created_at.desc(), reviews::id.desc()))
        .limit(limit)
        .select((Review::as_select(), Hike::as_select()))
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))?;

    Ok(rows
        .into_iter()
        .map(|(review, hike)| ReviewWithHike { review, hike })
        .collect())
}

/// Live count and average rating for a hike; average is 0.0 with no reviews
pub fn rating_summary(conn: &mut SqliteConnection, hike_id: i64) -> Result<RatingSummary, SocialError> {
    let (count, halves_sum): (i64, Option<i64>) = reviews::table
        .filter(reviews::hike_id.eq(hike_id))
        .select((diesel::dsl::count_star(), diesel::dsl::sum(reviews::rating_halves)))
        .first(conn)
        .map_err(|e| SocialError::db("Aggregate query", e))?;

    let average_rating = match (count, halves_sum) {
        (0, _) | (_, None) => 0.0,
        (n, Some(sum)) => sum as f64 / (2.0 * n as f64),
    };

    Ok(RatingSummary {
        total_reviews: count,
        average_rating,
    })
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create the author's review of a hike, or overwrite rating and body of the
/// existing one. Returns the row and whether it was newly created.
///
/// `upvote_count` and `created_at` are never touched on update.
pub fn upsert_review(
    conn: &mut SqliteConnection,
    hike_id: i64,
    author_id: i64,
    rating_halves: i32,
    body: Option<&str>,
) -> Result<(Review, bool), SocialError> {
    let now = current_timestamp();

    let created = match find_review(conn, hike_id, author_id)? {
        Some(existing) => {
            diesel::update(reviews::table.filter(reviews::id.eq(existing.id)))
                .set((
                    reviews::rating_halves.eq(rating_halves),
                    reviews::body.eq(body),
                    reviews::updated_at.eq(&now),
                ))
                .execute(conn)
                .map_err(|e| SocialError::db("Update review", e))?;
            false
        }
        None => {
            diesel::insert_into(reviews::table)
                .values(&NewReview {
                    hike_id,
                    author_id,
                    rating_halves,
                    body,
                    upvote_count: 0,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)
                .map_err(|e| SocialError::db("Insert review", e))?;
            true
        }
    };

    let review = find_review(conn, hike_id, author_id)?
        .ok_or_else(|| SocialError::Internal("Failed to retrieve saved review".into()))?;

    Ok((review, created))
}

/// Overwrite the cached upvote counter
pub fn set_upvote_count(
    conn: &mut SqliteConnection,
    review_id: i64,
    upvote_count: i32,
) -> Result<(), SocialError> {
    diesel::update(reviews::table.filter(reviews::id.eq(review_id)))
        .set(reviews::upvote_count.eq(upvote_count))
        .execute(conn)
        .map_err(|e| SocialError::db("Update upvote count", e))?;
    Ok(())
}
