//! Review service - create-or-update reviews, hike listings and upvotes
//!
//! Every public method is one database transaction. Writes use the
//! immediate (write-locking) transaction so that lookup-then-insert and
//! read-counter-then-write cannot interleave with another request.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::db::models::ratings;
use crate::db::{hikes, reviews, upvotes, users, SocialDb};
use crate::error::SocialError;
use crate::views::{HikeReviewsView, RatingView, ReviewInputView, ReviewView, UpvoteView};

use super::events::{EventBus, SocialEvent};

/// Default cap on review body length, in characters
pub const DEFAULT_MAX_BODY_CHARS: usize = 2000;

pub struct ReviewService {
    db: Arc<SocialDb>,
    events: Arc<EventBus>,
    max_body_chars: usize,
}

impl ReviewService {
    pub fn new(db: Arc<SocialDb>, events: Arc<EventBus>) -> Self {
        Self {
            db,
            events,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
        }
    }

    pub fn with_max_body_chars(mut self, max_body_chars: usize) -> Self {
        self.max_body_chars = max_body_chars;
        self
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Reviews for a hike with aggregates. `viewer` is the caller, if any;
    /// anonymous callers see `current_user_upvoted = false` everywhere.
    pub fn list_for_hike(
        &self,
        hike_id: i64,
        viewer: Option<i64>,
    ) -> Result<HikeReviewsView, SocialError> {
        self.db.with_read_tx(|conn| {
            hikes::require_hike(conn, hike_id)?;
            let summary = reviews::rating_summary(conn, hike_id)?;
            let upvoted_ids = match viewer {
                Some(user_id) => upvotes::upvoted_review_ids_for_hike(conn, hike_id, user_id)?,
                None => HashSet::new(),
            };

            let views = reviews::list_reviews_for_hike(conn, hike_id)?
                .into_iter()
                .map(|row| {
                    let upvoted = upvoted_ids.contains(&row.review.id);
                    ReviewView::new(row.review, row.author_username, upvoted)
                })
                .collect();

            Ok(HikeReviewsView {
                hike_id,
                average_rating: summary.average_rating,
                total_reviews: summary.total_reviews,
                reviews: views,
            })
        })
    }

    /// Ratings projection for a hike, same order as `list_for_hike`
    pub fn ratings_for_hike(&self, hike_id: i64) -> Result<Vec<RatingView>, SocialError> {
        self.db.with_read_tx(|conn| {
            hikes::require_hike(conn, hike_id)?;

            let mut views = Vec::new();
            for row in reviews::list_reviews_for_hike(conn, hike_id)? {
                let upvoters = upvotes::list_upvoters(conn, row.review.id)?;
                views.push(RatingView::new(row.review, upvoters));
            }
            Ok(views)
        })
    }

    /// Whether the user currently upvotes the review (edge set, not the counter)
    pub fn has_upvoted(&self, review_id: i64, user_id: i64) -> Result<bool, SocialError> {
        self.db
            .with_conn(|conn| upvotes::has_upvoted(conn, review_id, user_id))
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create the caller's review of a hike, or update it in place
    pub fn create_or_update(
        &self,
        hike_id: i64,
        author_id: i64,
        input: &ReviewInputView,
    ) -> Result<ReviewView, SocialError> {
        let rating = input
            .rating
            .ok_or_else(|| SocialError::InvalidArgument("Rating is required".into()))?;
        let rating_halves = ratings::to_halves(rating)?;
        self.validate_body(input.body.as_deref())?;

        let (view, created) = self.db.with_write_tx(|conn| {
            hikes::require_hike(conn, hike_id)?;
            let author = users::get_user(conn, author_id)?
                .ok_or_else(|| SocialError::NotFound(format!("User not found with id: {}", author_id)))?;

            let (review, created) =
                reviews::upsert_review(conn, hike_id, author_id, rating_halves, input.body.as_deref())?;
            let upvoted = upvotes::has_upvoted(conn, review.id, author_id)?;

            Ok((ReviewView::new(review, author.username, upvoted), created))
        })?;

        let event = if created {
            info!(review_id = view.review_id, hike_id, author_id, "Review created");
            SocialEvent::ReviewCreated {
                review_id: view.review_id,
                hike_id,
                author_id,
            }
        } else {
            debug!(review_id = view.review_id, hike_id, author_id, "Review updated");
            SocialEvent::ReviewUpdated {
                review_id: view.review_id,
                hike_id,
                author_id,
            }
        };
        self.events.emit(event);

        Ok(view)
    }

    /// Flip the caller's upvote on a review
    pub fn toggle_upvote(&self, review_id: i64, user_id: i64) -> Result<UpvoteView, SocialError> {
        let outcome = self
            .db
            .with_write_tx(|conn| upvotes::toggle_upvote(conn, review_id, user_id))?;

        self.emit_upvote(user_id, outcome.into());
        Ok(outcome.into())
    }

    /// Set the caller's upvote to an explicit state
    pub fn set_upvote(
        &self,
        review_id: i64,
        user_id: i64,
        upvoted: bool,
    ) -> Result<UpvoteView, SocialError> {
        let outcome = self
            .db
            .with_write_tx(|conn| upvotes::set_upvote(conn, review_id, user_id, upvoted))?;

        self.emit_upvote(user_id, outcome.into());
        Ok(outcome.into())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate_body(&self, body: Option<&str>) -> Result<(), SocialError> {
        if let Some(body) = body {
            let len = body.chars().count();
            if len > self.max_body_chars {
                return Err(SocialError::InvalidArgument(format!(
                    "Review body must not exceed {} characters (got {})",
                    self.max_body_chars, len
                )));
            }
        }
        Ok(())
    }

    fn emit_upvote(&self, user_id: i64, view: UpvoteView) {
        debug!(
            review_id = view.review_id,
            user_id,
            upvoted = view.upvoted,
            upvote_count = view.upvote_count,
            "Upvote changed"
        );
        self.events.emit(SocialEvent::UpvoteChanged {
            review_id: view.review_id,
            user_id,
            upvoted: view.upvoted,
            upvote_count: view.upvote_count,
        });
    }
}
