//! Rating aggregates for a hike
//!
//! Values are computed live from the reviews table on every call; nothing is
//! cached, so they can never drift from the stored ratings.

use std::sync::Arc;

use crate::db::reviews::RatingSummary;
use crate::db::{hikes, reviews, SocialDb};
use crate::error::SocialError;

pub struct RatingAggregator {
    db: Arc<SocialDb>,
}

impl RatingAggregator {
    pub fn new(db: Arc<SocialDb>) -> Self {
        Self { db }
    }

    /// Mean rating across the hike's reviews, 0.0 when there are none
    pub fn average_rating(&self, hike_id: i64) -> Result<f64, SocialError> {
        Ok(self.summary(hike_id)?.average_rating)
    }

    pub fn total_reviews(&self, hike_id: i64) -> Result<i64, SocialError> {
        Ok(self.summary(hike_id)?.total_reviews)
    }

    /// Count and average from one snapshot
    pub fn summary(&self, hike_id: i64) -> Result<RatingSummary, SocialError> {
        self.db.with_read_tx(|conn| {
            hikes::require_hike(conn, hike_id)?;
            reviews::rating_summary(conn, hike_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users;
    use crate::error::ErrorKind;

    #[test]
    fn test_average_and_total() {
        let db = Arc::new(SocialDb::open_in_memory().unwrap());
        let hike_id = db
            .with_conn(|conn| {
                let hike = hikes::create_hike(conn, "Mount Si")?;
                for (name, halves) in [("a", 8), ("b", 9), ("c", 3)] {
                    let user = users::create_user(conn, name)?;
                    reviews::upsert_review(conn, hike.id, user.id, halves, None)?;
                }
                Ok(hike.id)
            })
            .unwrap();

        let aggregator = RatingAggregator::new(db);
        assert_eq!(aggregator.total_reviews(hike_id).unwrap(), 3);
        // (4.0 + 4.5 + 1.5) / 3
        let avg = aggregator.average_rating(hike_id).unwrap();
        assert!((avg - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hike_without_reviews() {
        let db = Arc::new(SocialDb::open_in_memory().unwrap());
        let hike_id = db
            .with_conn(|conn| Ok(hikes::create_hike(conn, "Empty")?.id))
            .unwrap();

        let aggregator = RatingAggregator::new(db);
        assert_eq!(aggregator.average_rating(hike_id).unwrap(), 0.0);
        assert_eq!(aggregator.total_reviews(hike_id).unwrap(), 0);

        let err = aggregator.summary(hike_id + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
