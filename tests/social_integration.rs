//! Integration tests for reviews, upvotes, follows and activity feeds
//!
//! These run against a file-backed database so that concurrent writers go
//! through separate pooled connections and real SQLite locking.

use hikehub_social::db::{hikes, upvotes, users};
use hikehub_social::views::ReviewInputView;
use hikehub_social::{Config, ErrorKind, Services, SocialDb};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

struct World {
    db: Arc<SocialDb>,
    services: Arc<Services>,
    _temp: TempDir,
}

/// Helper to open a fresh database in a temporary storage directory
fn create_world() -> World {
    let temp = TempDir::new().unwrap();
    let config = Config {
        storage_dir: temp.path().to_path_buf(),
        ..Default::default()
    };
    let db = Arc::new(
        SocialDb::open(&config.storage_dir, config.pool_size, config.busy_timeout_ms).unwrap(),
    );
    let services = Arc::new(Services::new(db.clone(), &config));
    World {
        db,
        services,
        _temp: temp,
    }
}

fn add_user(world: &World, name: &str) -> i64 {
    world
        .db
        .with_conn(|conn| Ok(users::create_user(conn, name)?.id))
        .unwrap()
}

fn add_hike(world: &World, name: &str) -> i64 {
    world
        .db
        .with_conn(|conn| Ok(hikes::create_hike(conn, name)?.id))
        .unwrap()
}

fn review(rating: f64, body: &str) -> ReviewInputView {
    ReviewInputView {
        rating: Some(rating),
        body: Some(body.to_string()),
    }
}

#[test]
fn test_concurrent_toggles_keep_count_equal_to_edges() {
    let world = create_world();
    let hike = add_hike(&world, "Mailbox Peak");
    let author = add_user(&world, "author");
    let review_id = world
        .services
        .reviews
        .create_or_update(hike, author, &review(4.0, "long"))
        .unwrap()
        .review_id;

    let voters: Vec<i64> = (0..8).map(|i| add_user(&world, &format!("voter{}", i))).collect();

    // Voter i toggles i + 1 times; odd counts end upvoted
    let handles: Vec<_> = voters
        .iter()
        .enumerate()
        .map(|(i, &voter)| {
            let services = world.services.clone();
            thread::spawn(move || {
                for _ in 0..=i {
                    services.reviews.toggle_upvote(review_id, voter).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (edges, stored) = world
        .db
        .with_conn(|conn| {
            let edges = upvotes::count_upvotes(conn, review_id)?;
            let stored = hikehub_social::db::reviews::require_review(conn, review_id)?.upvote_count;
            Ok((edges, stored))
        })
        .unwrap();

    assert_eq!(edges, 4);
    assert_eq!(i64::from(stored), edges);
}

#[test]
fn test_concurrent_submissions_create_one_review() {
    let world = create_world();
    let hike = add_hike(&world, "Lake Serene");
    let author = add_user(&world, "author");

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let services = world.services.clone();
            thread::spawn(move || {
                let rating = 1.0 + (i as f64) * 0.5;
                services
                    .reviews
                    .create_or_update(hike, author, &review(rating, "again"))
                    .unwrap()
                    .review_id
            })
        })
        .collect();
    let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ids.iter().all(|&id| id == ids[0]));
    let listing = world.services.reviews.list_for_hike(hike, None).unwrap();
    assert_eq!(listing.total_reviews, 1);
    assert_eq!(world.services.ratings.total_reviews(hike).unwrap(), 1);
}

#[test]
fn test_resubmission_updates_in_place() {
    let world = create_world();
    let hike = add_hike(&world, "Wallace Falls");
    let alice = add_user(&world, "alice");

    let first = world
        .services
        .reviews
        .create_or_update(hike, alice, &review(3.0, "wet"))
        .unwrap();
    thread::sleep(Duration::from_millis(10));
    let second = world
        .services
        .reviews
        .create_or_update(hike, alice, &review(4.5, "dried out"))
        .unwrap();

    assert_eq!(first.review_id, second.review_id);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at > first.updated_at);

    let listing = world.services.reviews.list_for_hike(hike, Some(alice)).unwrap();
    assert_eq!(listing.total_reviews, 1);
    assert_eq!(listing.average_rating, 4.5);
    assert_eq!(listing.reviews[0].body.as_deref(), Some("dried out"));
}

#[test]
fn test_ordering_follows_upvotes_then_recency() {
    let world = create_world();
    let hike = add_hike(&world, "Poo Poo Point");
    let alice = add_user(&world, "alice");
    let bob = add_user(&world, "bob");
    let carol = add_user(&world, "carol");

    let older = world
        .services
        .reviews
        .create_or_update(hike, alice, &review(3.0, "fine"))
        .unwrap();
    thread::sleep(Duration::from_millis(10));
    let newer = world
        .services
        .reviews
        .create_or_update(hike, bob, &review(5.0, "paragliders"))
        .unwrap();

    let listing = world.services.reviews.list_for_hike(hike, None).unwrap();
    let order: Vec<i64> = listing.reviews.iter().map(|r| r.review_id).collect();
    assert_eq!(order, vec![newer.review_id, older.review_id]);

    world.services.reviews.toggle_upvote(older.review_id, carol).unwrap();

    let listing = world.services.reviews.list_for_hike(hike, Some(carol)).unwrap();
    let order: Vec<i64> = listing.reviews.iter().map(|r| r.review_id).collect();
    assert_eq!(order, vec![older.review_id, newer.review_id]);
    assert!(listing.reviews[0].current_user_upvoted);
    assert_eq!(listing.average_rating, 4.0);
}

#[test]
fn test_rating_validation() {
    let world = create_world();
    let hike = add_hike(&world, "Granite Mountain");
    let alice = add_user(&world, "alice");

    for rating in [1.0, 1.5, 3.0, 4.5, 5.0] {
        let view = world
            .services
            .reviews
            .create_or_update(hike, alice, &review(rating, "ok"))
            .unwrap();
        assert_eq!(view.rating, rating);
    }

    for rating in [0.0, 0.5, 4.3, 5.5, -1.0, f64::NAN] {
        let err = world
            .services
            .reviews
            .create_or_update(hike, alice, &review(rating, "bad"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "rating {}", rating);
    }
}

#[test]
fn test_follow_errors_and_directionality() {
    let world = create_world();
    let alice = add_user(&world, "alice");
    let bob = add_user(&world, "bob");
    let follows = &world.services.follows;

    assert_eq!(
        follows.follow(alice, "ghost").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        follows.follow(alice, "alice").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );

    follows.follow(alice, "bob").unwrap();
    assert_eq!(
        follows.follow(alice, "bob").unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );

    follows.follow(bob, "alice").unwrap();
    follows.unfollow(alice, bob).unwrap();
    assert!(!follows.is_following(alice, bob).unwrap());
    assert!(follows.is_following(bob, alice).unwrap());
    assert_eq!(
        follows.unfollow(alice, bob).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_activity_feed() {
    let world = create_world();
    let alice = add_user(&world, "alice");
    let bob = add_user(&world, "bob");

    let trails = ["Heather Lake", "Mount Pilchuck", "Lake 22"];
    for (i, name) in trails.iter().enumerate() {
        let hike = add_hike(&world, name);
        world
            .services
            .reviews
            .create_or_update(hike, bob, &review(3.0 + i as f64 * 0.5, name))
            .unwrap();
        thread::sleep(Duration::from_millis(10));
    }

    let activity = &world.services.activity;
    assert_eq!(
        activity.get_activity(alice, bob, None).unwrap_err().kind(),
        ErrorKind::Forbidden
    );

    world.services.follows.follow(alice, "bob").unwrap();

    let feed = activity.get_activity(alice, bob, None).unwrap();
    let names: Vec<&str> = feed
        .recent_activity
        .iter()
        .map(|item| item.hike_name.as_str())
        .collect();
    assert_eq!(names, vec!["Lake 22", "Mount Pilchuck", "Heather Lake"]);
    assert!(feed.recent_activity.iter().all(|item| item.username == "bob"));

    let latest = activity.get_activity(alice, bob, Some(1)).unwrap();
    assert_eq!(latest.recent_activity.len(), 1);
    assert_eq!(latest.recent_activity[0].hike_name, "Lake 22");
    assert_eq!(latest.recent_activity[0].rating, 4.0);

    // Reverse direction is not implied
    assert_eq!(
        activity.get_activity(bob, alice, None).unwrap_err().kind(),
        ErrorKind::Forbidden
    );
}
