//! Activity feed - a followed user's recent reviews

use std::sync::Arc;

use tracing::debug;

use crate::db::{follows, reviews, users, SocialDb};
use crate::error::SocialError;
use crate::views::{ActivityFeedView, ActivityItemView};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

pub struct ActivityService {
    db: Arc<SocialDb>,
    default_limit: i64,
    max_limit: i64,
}

impl ActivityService {
    pub fn new(db: Arc<SocialDb>) -> Self {
        Self {
            db,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    pub fn with_limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Missing limit uses the default, oversized limits are clamped,
    /// and zero or negative limits are rejected.
    pub fn normalize_limit(&self, requested: Option<i64>) -> Result<i64, SocialError> {
        match requested {
            None => Ok(self.default_limit),
            Some(n) if n < 1 => Err(SocialError::InvalidArgument(format!(
                "limit must be at least 1, got {}",
                n
            ))),
            Some(n) => Ok(n.min(self.max_limit)),
        }
    }

    /// Recent reviews by `target_id`, newest first.
    ///
    /// Only visible when the requester follows the target. An unknown target
    /// is reported as not found before the follow check runs.
    pub fn get_activity(
        &self,
        requesting_id: i64,
        target_id: i64,
        limit: Option<i64>,
    ) -> Result<ActivityFeedView, SocialError> {
        let limit = self.normalize_limit(limit)?;

        self.db.with_read_tx(|conn| {
            let target = users::get_user(conn, target_id)?
                .ok_or_else(|| SocialError::NotFound(format!("User not found with id: {}", target_id)))?;

            if !follows::is_following(conn, requesting_id, target_id)? {
                return Err(SocialError::Forbidden(
                    "You can only view activity of users you follow".into(),
                ));
            }

            let items: Vec<ActivityItemView> = reviews::list_reviews_by_author(conn, target_id, limit)?
                .into_iter()
                .map(|row| ActivityItemView::review(row, &target.username))
                .collect();

            debug!(requesting_id, target_id, limit, items = items.len(), "Activity feed read");

            Ok(ActivityFeedView {
                user_id: target.id,
                username: target.username,
                recent_activity: items,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::hikes;
    use crate::error::ErrorKind;

    #[test]
    fn test_normalize_limit() {
        let db = Arc::new(SocialDb::open_in_memory().unwrap());
        let service = ActivityService::new(db);

        assert_eq!(service.normalize_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(service.normalize_limit(Some(5)).unwrap(), 5);
        assert_eq!(service.normalize_limit(Some(5000)).unwrap(), MAX_LIMIT);
        assert_eq!(
            service.normalize_limit(Some(0)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            service.normalize_limit(Some(-3)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_feed_requires_follow() {
        let db = Arc::new(SocialDb::open_in_memory().unwrap());
        let (alice, bob) = db
            .with_conn(|conn| {
                let alice = users::create_user(conn, "alice")?.id;
                let bob = users::create_user(conn, "bob")?.id;
                let hike = hikes::create_hike(conn, "Tiger Mountain")?;
                reviews::upsert_review(conn, hike.id, bob, 7, Some("steep"))?;
                Ok((alice, bob))
            })
            .unwrap();
        let service = ActivityService::new(db.clone());

        let err = service.get_activity(alice, bob, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let missing = service.get_activity(alice, bob + 100, None).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        db.with_conn(|conn| follows::create_follow(conn, alice, bob).map(|_| ()))
            .unwrap();
        let feed = service.get_activity(alice, bob, None).unwrap();
        assert_eq!(feed.username, "bob");
        assert_eq!(feed.recent_activity.len(), 1);
        let item = &feed.recent_activity[0];
        assert_eq!(item.activity_type, "review");
        assert_eq!(item.hike_name, "Tiger Mountain");
        assert_eq!(item.rating, 3.5);
        assert_eq!(item.comment.as_deref(), Some("steep"));
    }
}
