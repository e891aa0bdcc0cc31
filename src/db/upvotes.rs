//! Review upvote edges
//!
//! The edge set is the source of truth for "has this user upvoted";
//! `reviews.upvote_count` is a cache kept in step with it. Mutations here
//! read the review, change the edge, then rewrite the counter, so they must
//! run inside `SocialDb::with_write_tx`.

use std::collections::HashSet;

use diesel::prelude::*;

use super::diesel_schema::{review_upvotes, reviews as reviews_table};
use super::models::{current_timestamp, NewReviewUpvote, Review, UpvoteOutcome};
use super::reviews;
use crate::error::SocialError;

// ============================================================================
// Read Operations
// ============================================================================

/// Whether the user currently upvotes the review
pub fn has_upvoted(
    conn: &mut SqliteConnection,
    review_id: i64,
    user_id: i64,
) -> Result<bool, SocialError> {
    diesel::select(diesel::dsl::exists(
        review_upvotes::table
            .filter(review_upvotes::review_id.eq(review_id))
            .filter(review_upvotes::user_id.eq(user_id)),
    ))
    .get_result(conn)
    .map_err(|e| SocialError::db("Query", e))
}

/// User ids upvoting a review, oldest upvote first
pub fn list_upvoters(conn: &mut SqliteConnection, review_id: i64) -> Result<Vec<i64>, SocialError> {
    review_upvotes::table
        .filter(review_upvotes::review_id.eq(review_id))
        .order((review_upvotes::created_at.asc(), review_upvotes::user_id.asc()))
        .select(review_upvotes::user_id)
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))
}

/// Ids of the hike's reviews that the user currently upvotes
pub fn upvoted_review_ids_for_hike(
    conn: &mut SqliteConnection,
    hike_id: i64,
    user_id: i64,
) -> Result<HashSet<i64>, SocialError> {
    let ids: Vec<i64> = review_upvotes::table
        .inner_join(reviews_table::table)
        .filter(reviews_table::hike_id.eq(hike_id))
        .filter(review_upvotes::user_id.eq(user_id))
        .select(review_upvotes::review_id)
        .load(conn)
        .map_err(|e| SocialError::db("Query", e))?;

    Ok(ids.into_iter().collect())
}

/// Number of live upvote edges for a review
pub fn count_upvotes(conn: &mut SqliteConnection, review_id: i64) -> Result<i64, SocialError> {
    review_upvotes::table
        .filter(review_upvotes::review_id.eq(review_id))
        .count()
        .get_result(conn)
        .map_err(|e| SocialError::db("Count query", e))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Flip the user's upvote on a review
pub fn toggle_upvote(
    conn: &mut SqliteConnection,
    review_id: i64,
    user_id: i64,
) -> Result<UpvoteOutcome, SocialError> {
    let review = reviews::require_review(conn, review_id)?;
    let currently = has_upvoted(conn, review_id, user_id)?;
    apply(conn, &review, user_id, !currently)
}

/// Put the user's upvote into the requested state; no-op if already there
pub fn set_upvote(
    conn: &mut SqliteConnection,
    review_id: i64,
    user_id: i64,
    upvoted: bool,
) -> Result<UpvoteOutcome, SocialError> {
    let review = reviews::require_review(conn, review_id)?;
    let currently = has_upvoted(conn, review_id, user_id)?;

    if currently == upvoted {
        return Ok(UpvoteOutcome {
            review_id,
            upvote_count: review.upvote_count,
            upvoted,
        });
    }

    apply(conn, &review, user_id, upvoted)
}

fn apply(
    conn: &mut SqliteConnection,
    review: &Review,
    user_id: i64,
    upvote: bool,
) -> Result<UpvoteOutcome, SocialError> {
    let upvote_count = if upvote {
        let now = current_timestamp();
        diesel::insert_into(review_upvotes::table)
            .values(&NewReviewUpvote {
                review_id: review.id,
                user_id,
                created_at: &now,
            })
            .execute(conn)
            .map_err(|e| SocialError::db("Insert upvote", e))?;
        review.upvote_count + 1
    } else {
        diesel::delete(
            review_upvotes::table
                .filter(review_upvotes::review_id.eq(review.id))
                .filter(review_upvotes::user_id.eq(user_id)),
        )
        .execute(conn)
        .map_err(|e| SocialError::db("Delete upvote", e))?;
        // floor at zero in case the cache had drifted below the edge count
        (review.upvote_count - 1).max(0)
    };

    reviews::set_upvote_count(conn, review.id, upvote_count)?;

    Ok(UpvoteOutcome {
        review_id: review.id,
        upvote_count,
        upvoted: upvote,
    })
}
