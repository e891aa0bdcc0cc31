//! Service layer
//!
//! Services own the transaction boundaries and validation for every public
//! operation. The HTTP layer only parses requests and renders results.

pub mod activity_service;
pub mod events;
pub mod follow_service;
pub mod rating_service;
pub mod response;
pub mod review_service;

use std::sync::Arc;

use crate::config::Config;
use crate::db::SocialDb;

pub use activity_service::ActivityService;
pub use events::{spawn_logging_listener, EventBus, EventListener, LoggingEventListener, SocialEvent};
pub use follow_service::FollowService;
pub use rating_service::RatingAggregator;
pub use review_service::ReviewService;

/// All services wired to one database and event bus
pub struct Services {
    pub reviews: Arc<ReviewService>,
    pub ratings: Arc<RatingAggregator>,
    pub follows: Arc<FollowService>,
    pub activity: Arc<ActivityService>,
    pub events: Arc<EventBus>,
}

impl Services {
    pub fn new(db: Arc<SocialDb>, config: &Config) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            reviews: Arc::new(
                ReviewService::new(db.clone(), events.clone())
                    .with_max_body_chars(config.max_review_body_chars),
            ),
            ratings: Arc::new(RatingAggregator::new(db.clone())),
            follows: Arc::new(FollowService::new(db.clone(), events.clone())),
            activity: Arc::new(
                ActivityService::new(db)
                    .with_limits(config.activity_default_limit, config.activity_max_limit),
            ),
            events,
        }
    }
}
