//! View types for HTTP API boundary
//!
//! These types use camelCase serialization for web clients.
//! Models in db/models.rs keep the storage shape (half-star ratings,
//! integer ids, raw rows).
//!
//! InputView types (suffix InputView) accept camelCase JSON and are
//! validated by the services, not here.

use serde::{Deserialize, Serialize};

use crate::db::models::{FollowEntry, Review, ReviewWithHike, UpvoteOutcome};

// ============================================================================
// Review Views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub review_id: i64,
    pub hike_id: i64,
    pub rating: f64,
    pub body: Option<String>,
    pub author_username: String,
    pub author_id: i64,
    pub upvote_count: i32,
    pub current_user_upvoted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ReviewView {
    pub fn new(review: Review, author_username: String, current_user_upvoted: bool) -> Self {
        Self {
            review_id: review.id,
            hike_id: review.hike_id,
            rating: review.rating(),
            body: review.body,
            author_username,
            author_id: review.author_id,
            upvote_count: review.upvote_count,
            current_user_upvoted,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HikeReviewsView {
    pub hike_id: i64,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub reviews: Vec<ReviewView>,
}

/// Rating projection with string ids and the upvoter list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: String,
    pub hike_id: String,
    pub user_id: String,
    pub rating: f64,
    pub comment: Option<String>,
    pub upvotes: i32,
    pub upvoted_by: Vec<String>,
    pub created_at: String,
}

impl RatingView {
    pub fn new(review: Review, upvoters: Vec<i64>) -> Self {
        Self {
            id: review.id.to_string(),
            hike_id: review.hike_id.to_string(),
            user_id: review.author_id.to_string(),
            rating: review.rating(),
            comment: review.body,
            upvotes: review.upvote_count,
            upvoted_by: upvoters.into_iter().map(|id| id.to_string()).collect(),
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteView {
    pub review_id: i64,
    pub upvote_count: i32,
    pub upvoted: bool,
}

impl From<UpvoteOutcome> for UpvoteView {
    fn from(o: UpvoteOutcome) -> Self {
        Self {
            review_id: o.review_id,
            upvote_count: o.upvote_count,
            upvoted: o.upvoted,
        }
    }
}

// ============================================================================
// Follow Views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendView {
    pub user_id: i64,
    pub username: String,
    pub friends_since: String,
}

impl From<FollowEntry> for FriendView {
    fn from(e: FollowEntry) -> Self {
        Self {
            user_id: e.user_id,
            username: e.username,
            friends_since: e.since,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendsListView {
    pub user_id: i64,
    pub total_friends: i64,
    pub total_followers: i64,
    pub friends: Vec<FriendView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatusView {
    pub is_following: bool,
    pub follows_back: bool,
}

// ============================================================================
// Activity Views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItemView {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub review_id: i64,
    pub hike_id: i64,
    pub hike_name: String,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
    pub username: String,
}

impl ActivityItemView {
    pub fn review(row: ReviewWithHike, username: &str) -> Self {
        Self {
            activity_type: "review".to_string(),
            review_id: row.review.id,
            hike_id: row.hike.id,
            hike_name: row.hike.name,
            rating: row.review.rating(),
            comment: row.review.body,
            created_at: row.review.created_at,
            username: username.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeedView {
    pub user_id: i64,
    pub username: String,
    pub recent_activity: Vec<ActivityItemView>,
}

// ============================================================================
// Input Views
// ============================================================================

/// Body of a create/update review request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInputView {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, alias = "reviewBody", alias = "comment")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowInputView {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpvoteInputView {
    pub upvoted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_input_accepts_body_aliases() {
        let a: ReviewInputView = serde_json::from_str(r#"{"rating": 4.5, "body": "x"}"#).unwrap();
        let b: ReviewInputView =
            serde_json::from_str(r#"{"rating": 4.5, "reviewBody": "x"}"#).unwrap();
        let c: ReviewInputView = serde_json::from_str(r#"{"rating": 4.5, "comment": "x"}"#).unwrap();
        assert_eq!(a.body.as_deref(), Some("x"));
        assert_eq!(b.body, a.body);
        assert_eq!(c.body, a.body);
    }

    #[test]
    fn review_input_without_rating_parses() {
        let v: ReviewInputView = serde_json::from_str("{}").unwrap();
        assert!(v.rating.is_none());
    }

    #[test]
    fn activity_item_serializes_type_field() {
        let item = ActivityItemView {
            activity_type: "review".into(),
            review_id: 1,
            hike_id: 2,
            hike_name: "Skyline".into(),
            rating: 4.0,
            comment: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            username: "alice".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "review");
        assert_eq!(json["hikeName"], "Skyline");
    }
}
