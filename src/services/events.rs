//! Event system for social operations
//!
//! Services emit an event after their transaction commits. Listeners are
//! used for audit logging; nothing is pushed to clients.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Events emitted by services
#[derive(Debug, Clone, PartialEq)]
pub enum SocialEvent {
    // Review events
    ReviewCreated {
        review_id: i64,
        hike_id: i64,
        author_id: i64,
    },
    ReviewUpdated {
        review_id: i64,
        hike_id: i64,
        author_id: i64,
    },

    // Upvote events
    UpvoteChanged {
        review_id: i64,
        user_id: i64,
        upvoted: bool,
        upvote_count: i32,
    },

    // Follow events
    FollowCreated {
        follower_id: i64,
        followed_id: i64,
    },
    FollowRemoved {
        follower_id: i64,
        followed_id: i64,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &SocialEvent);
}

/// Event bus for broadcasting social events
pub struct EventBus {
    sender: broadcast::Sender<SocialEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: SocialEvent) {
        trace!(event = ?event, "Emitting social event");
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<SocialEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &SocialEvent) {
        match event {
            SocialEvent::ReviewCreated { review_id, hike_id, author_id } => {
                debug!(review_id, hike_id, author_id, "Review created");
            }
            SocialEvent::ReviewUpdated { review_id, hike_id, author_id } => {
                debug!(review_id, hike_id, author_id, "Review updated");
            }
            SocialEvent::UpvoteChanged {
                review_id,
                user_id,
                upvoted,
                upvote_count,
            } => {
                debug!(review_id, user_id, upvoted, upvote_count, "Upvote changed");
            }
            SocialEvent::FollowCreated { follower_id, followed_id } => {
                debug!(follower_id, followed_id, "Follow created");
            }
            SocialEvent::FollowRemoved { follower_id, followed_id } => {
                debug!(follower_id, followed_id, "Follow removed");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
