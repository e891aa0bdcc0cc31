//! Follow service - directed follow edges between users
//!
//! "Friends" in the API are the users someone follows. Edges are one-way;
//! following back is a separate edge created by the other user.

use std::sync::Arc;

use tracing::info;

use crate::db::{follows, users, SocialDb};
use crate::error::SocialError;
use crate::views::{FollowStatusView, FriendView, FriendsListView};

use super::events::{EventBus, SocialEvent};

pub struct FollowService {
    db: Arc<SocialDb>,
    events: Arc<EventBus>,
}

impl FollowService {
    pub fn new(db: Arc<SocialDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Follow the user named `username`.
    ///
    /// Checks run in order: unknown username, self-follow, existing edge.
    pub fn follow(&self, follower_id: i64, username: &str) -> Result<FriendView, SocialError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SocialError::InvalidArgument("Username is required".into()));
        }

        let view = self.db.with_write_tx(|conn| {
            let target = users::find_user_by_username(conn, username)?
                .ok_or_else(|| SocialError::NotFound(format!("User not found: {}", username)))?;

            if target.id == follower_id {
                return Err(SocialError::InvalidArgument("Cannot follow yourself".into()));
            }
            if follows::is_following(conn, follower_id, target.id)? {
                return Err(SocialError::AlreadyExists(format!(
                    "Already following {}",
                    target.username
                )));
            }

            let edge = follows::create_follow(conn, follower_id, target.id)?;
            Ok(FriendView {
                user_id: target.id,
                username: target.username,
                friends_since: edge.created_at,
            })
        })?;

        info!(follower_id, followed_id = view.user_id, "Follow created");
        self.events.emit(SocialEvent::FollowCreated {
            follower_id,
            followed_id: view.user_id,
        });
        Ok(view)
    }

    /// Remove the edge follower -> followed. The reverse edge is untouched.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<(), SocialError> {
        let removed = self
            .db
            .with_write_tx(|conn| follows::delete_follow(conn, follower_id, followed_id))?;

        if !removed {
            return Err(SocialError::NotFound(format!(
                "Not following user {}",
                followed_id
            )));
        }

        info!(follower_id, followed_id, "Follow removed");
        self.events.emit(SocialEvent::FollowRemoved {
            follower_id,
            followed_id,
        });
        Ok(())
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool, SocialError> {
        self.db
            .with_conn(|conn| follows::is_following(conn, follower_id, followed_id))
    }

    /// Both directions between the caller and another user
    pub fn status(&self, user_id: i64, other_id: i64) -> Result<FollowStatusView, SocialError> {
        self.db.with_read_tx(|conn| {
            Ok(FollowStatusView {
                is_following: follows::is_following(conn, user_id, other_id)?,
                follows_back: follows::is_following(conn, other_id, user_id)?,
            })
        })
    }

    pub fn list_following(&self, user_id: i64) -> Result<Vec<FriendView>, SocialError> {
        let entries = self
            .db
            .with_conn(|conn| follows::list_following(conn, user_id))?;
        Ok(entries.into_iter().map(FriendView::from).collect())
    }

    pub fn list_followers(&self, user_id: i64) -> Result<Vec<FriendView>, SocialError> {
        let entries = self
            .db
            .with_conn(|conn| follows::list_followers(conn, user_id))?;
        Ok(entries.into_iter().map(FriendView::from).collect())
    }

    pub fn count_following(&self, user_id: i64) -> Result<i64, SocialError> {
        self.db
            .with_conn(|conn| follows::count_following(conn, user_id))
    }

    pub fn count_followers(&self, user_id: i64) -> Result<i64, SocialError> {
        self.db
            .with_conn(|conn| follows::count_followers(conn, user_id))
    }

    /// Followed users plus both counts, read from one snapshot
    pub fn friends_list(&self, user_id: i64) -> Result<FriendsListView, SocialError> {
        self.db.with_read_tx(|conn| {
            let friends = follows::list_following(conn, user_id)?;
            Ok(FriendsListView {
                user_id,
                total_friends: follows::count_following(conn, user_id)?,
                total_followers: follows::count_followers(conn, user_id)?,
                friends: friends.into_iter().map(FriendView::from).collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn setup() -> (FollowService, Arc<EventBus>, i64, i64) {
        let db = Arc::new(SocialDb::open_in_memory().unwrap());
        let (a, b) = db
            .with_conn(|conn| {
                let a = users::create_user(conn, "alice")?.id;
                let b = users::create_user(conn, "bob")?.id;
                Ok((a, b))
            })
            .unwrap();
        let events = Arc::new(EventBus::new());
        (FollowService::new(db, events.clone()), events, a, b)
    }

    #[test]
    fn test_follow_then_unfollow() {
        let (service, events, alice, bob) = setup();
        let mut rx = events.subscribe();

        let friend = service.follow(alice, "bob").unwrap();
        assert_eq!(friend.user_id, bob);
        assert_eq!(friend.username, "bob");
        assert!(service.is_following(alice, bob).unwrap());
        assert!(!service.is_following(bob, alice).unwrap());
        assert_eq!(
            rx.try_recv().unwrap(),
            SocialEvent::FollowCreated {
                follower_id: alice,
                followed_id: bob
            }
        );

        service.unfollow(alice, bob).unwrap();
        assert!(!service.is_following(alice, bob).unwrap());

        let err = service.unfollow(alice, bob).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_follow_error_order() {
        let (service, _events, alice, _bob) = setup();

        let unknown = service.follow(alice, "nobody").unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::NotFound);

        let own = service.follow(alice, "alice").unwrap_err();
        assert_eq!(own.kind(), ErrorKind::InvalidArgument);

        service.follow(alice, "bob").unwrap();
        let dup = service.follow(alice, "bob").unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::AlreadyExists);

        let blank = service.follow(alice, "  ").unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::InvalidArgument);

        assert_eq!(service.count_following(alice).unwrap(), 1);
    }

    #[test]
    fn test_unfollow_keeps_reverse_edge() {
        let (service, _events, alice, bob) = setup();
        service.follow(alice, "bob").unwrap();
        service.follow(bob, "alice").unwrap();

        let status = service.status(alice, bob).unwrap();
        assert!(status.is_following && status.follows_back);

        service.unfollow(alice, bob).unwrap();
        let status = service.status(alice, bob).unwrap();
        assert!(!status.is_following);
        assert!(status.follows_back);
    }

    #[test]
    fn test_friends_list_counts() {
        let (service, _events, alice, bob) = setup();
        service.follow(alice, "bob").unwrap();
        service.follow(bob, "alice").unwrap();

        let list = service.friends_list(alice).unwrap();
        assert_eq!(list.total_friends, 1);
        assert_eq!(list.total_followers, 1);
        assert_eq!(list.friends[0].username, "bob");

        let followers = service.list_followers(bob).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].user_id, alice);
        assert_eq!(service.list_following(bob).unwrap()[0].user_id, alice);
        assert_eq!(service.count_followers(bob).unwrap(), 1);
    }
}
