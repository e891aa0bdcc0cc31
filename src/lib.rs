//! HikeHub Social - reviews, upvotes, follows and activity feeds for hikes
//!
//! Runs behind an authenticating gateway that forwards the caller's user id.
//! Users and hikes are owned by the catalog; this service keeps a mirror of
//! them only for existence checks and usernames.
//!
//! ## Architecture
//!
//! - **db**: Diesel repositories over a pooled SQLite database
//! - **services**: transaction boundaries, validation and events
//! - **http**: thin hyper router that maps `ErrorKind` to status codes
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/hikehub-social/
//! ├── social.db        # SQLite database (WAL mode)
//! └── config.toml      # Configuration
//! ```
//!
//! ## Consistency
//!
//! - One review per (hike, author); a second submission updates in place.
//! - A review's `upvote_count` always equals its number of upvote edges.
//! - Follow edges are directed; removing one never touches the reverse edge.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod identity;
pub mod services;
pub mod views;

// Re-exports
pub use config::Config;
pub use db::SocialDb;
pub use error::{ErrorKind, SocialError};
pub use http::HttpServer;
pub use identity::{IdentityResolver, TrustedHeaderResolver};
pub use services::{
    ActivityService, EventBus, FollowService, RatingAggregator, ReviewService, Services,
    SocialEvent,
};
