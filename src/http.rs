//! HTTP API for reviews, upvotes and the follow graph
//!
//! ## Reviews
//! - `PUT /hikes/{hikeId}/reviews` - Create or update the caller's review
//! - `GET /hikes/{hikeId}/reviews` - Reviews with average and total
//! - `GET /hikes/{hikeId}/ratings` - Ratings with upvoter lists
//! - `POST /reviews/{reviewId}/upvote` - Toggle the caller's upvote
//! - `PUT /reviews/{reviewId}/upvote` - Set the upvote, body `{"upvoted": bool}`
//!
//! ## Friends
//! - `POST /friends` - Follow a user, body `{"username": "..."}`
//! - `DELETE /friends/{userId}` - Unfollow
//! - `GET /friends` - Followed users with counts
//! - `GET /friends/followers` - Users following the caller
//! - `GET /friends/{userId}/status` - Follow status in both directions
//! - `GET /friends/{userId}/activity?limit=N` - A followed user's recent reviews
//!
//! The caller is identified by the configured identity header
//! (`x-user-id` by default). Every route except `/health` and the two
//! `/hikes/...` listings requires it.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X PUT -H "x-user-id: 1" -H "Content-Type: application/json" \
//!      -d '{"rating": 4.5, "body": "Great views"}' \
//!      http://localhost:8091/hikes/7/reviews
//!
//! curl -H "x-user-id: 1" "http://localhost:8091/friends/2/activity?limit=5"
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::db::SocialDb;
use crate::error::SocialError;
use crate::identity::{require_user, IdentityResolver};
use crate::services::response::{self, HandlerResult};
use crate::services::Services;
use crate::views::{FollowInputView, ReviewInputView, SetUpvoteInputView};

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    limit: Option<i64>,
}

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    db: Arc<SocialDb>,
    identity: Arc<dyn IdentityResolver>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(
        services: Arc<Services>,
        db: Arc<SocialDb>,
        identity: Arc<dyn IdentityResolver>,
        bind_addr: SocketAddr,
    ) -> Self {
        Self {
            services,
            db,
            identity,
            bind_addr,
        }
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), SocialError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Route requests to handlers
    pub async fn handle_request<B>(
        &self,
        req: Request<B>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();
        let method = req.method().clone();
        debug!(method = %method, path = %path, "Incoming request");

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let token = req
            .headers()
            .get(self.identity.header_name())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let caller = match self.resolve_caller(token).await {
            Ok(caller) => caller,
            Err(e) => return Ok(response::error_response(e)),
        };

        let result = match (&method, segments.as_slice()) {
            (&Method::GET, ["health"]) => self.handle_health().await,

            // Reviews
            (&Method::PUT, ["hikes", hike_id, "reviews"]) => {
                self.handle_put_review(req, caller, hike_id).await
            }
            (&Method::GET, ["hikes", hike_id, "reviews"]) => {
                self.handle_list_reviews(caller, hike_id).await
            }
            (&Method::GET, ["hikes", hike_id, "ratings"]) => {
                self.handle_list_ratings(hike_id).await
            }
            (&Method::POST, ["reviews", review_id, "upvote"]) => {
                self.handle_toggle_upvote(caller, review_id).await
            }
            (&Method::PUT, ["reviews", review_id, "upvote"]) => {
                self.handle_set_upvote(req, caller, review_id).await
            }

            // Friends
            (&Method::POST, ["friends"]) => self.handle_follow(req, caller).await,
            (&Method::GET, ["friends"]) => self.handle_friends(caller).await,
            (&Method::GET, ["friends", "followers"]) => self.handle_followers(caller).await,
            (&Method::DELETE, ["friends", user_id]) => self.handle_unfollow(caller, user_id).await,
            (&Method::GET, ["friends", user_id, "status"]) => {
                self.handle_follow_status(caller, user_id).await
            }
            (&Method::GET, ["friends", user_id, "activity"]) => {
                let query = req.uri().query().unwrap_or("").to_string();
                self.handle_activity(caller, user_id, &query).await
            }

            (_, ["health"])
            | (_, ["hikes", _, "reviews"])
            | (_, ["hikes", _, "ratings"])
            | (_, ["reviews", _, "upvote"])
            | (_, ["friends", ..]) => Ok(response::method_not_allowed()),

            _ => Ok(response::not_found("Not found")),
        };

        Ok(result.unwrap_or_else(response::error_response))
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    async fn handle_health(&self) -> HandlerResult {
        let db = self.db.clone();
        let stats = blocking(move || db.stats()).await?;
        Ok(response::ok(&serde_json::json!({
            "status": "ok",
            "reviews": stats.review_count,
            "upvotes": stats.upvote_count,
            "follows": stats.follow_count,
        })))
    }

    async fn handle_put_review<B>(
        &self,
        req: Request<B>,
        caller: Option<i64>,
        hike_id: &str,
    ) -> HandlerResult
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let hike_id = parse_id(hike_id, "hike id")?;
        let user_id = require_user(caller)?;
        let input: ReviewInputView = read_json(req).await?;

        let reviews = self.services.reviews.clone();
        let view = blocking(move || reviews.create_or_update(hike_id, user_id, &input)).await?;
        Ok(response::ok(&view))
    }

    async fn handle_list_reviews(&self, viewer: Option<i64>, hike_id: &str) -> HandlerResult {
        let hike_id = parse_id(hike_id, "hike id")?;

        let reviews = self.services.reviews.clone();
        let view = blocking(move || reviews.list_for_hike(hike_id, viewer)).await?;
        Ok(response::ok(&view))
    }

    async fn handle_list_ratings(&self, hike_id: &str) -> HandlerResult {
        let hike_id = parse_id(hike_id, "hike id")?;

        let reviews = self.services.reviews.clone();
        let ratings = blocking(move || reviews.ratings_for_hike(hike_id)).await?;
        Ok(response::ok(&ratings))
    }

    async fn handle_toggle_upvote(&self, caller: Option<i64>, review_id: &str) -> HandlerResult {
        let review_id = parse_id(review_id, "review id")?;
        let user_id = require_user(caller)?;

        let reviews = self.services.reviews.clone();
        let view = blocking(move || reviews.toggle_upvote(review_id, user_id)).await?;
        Ok(response::ok(&view))
    }

    async fn handle_set_upvote<B>(
        &self,
        req: Request<B>,
        caller: Option<i64>,
        review_id: &str,
    ) -> HandlerResult
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let review_id = parse_id(review_id, "review id")?;
        let user_id = require_user(caller)?;
        let input: SetUpvoteInputView = read_json(req).await?;

        let reviews = self.services.reviews.clone();
        let view =
            blocking(move || reviews.set_upvote(review_id, user_id, input.upvoted)).await?;
        Ok(response::ok(&view))
    }

    async fn handle_follow<B>(&self, req: Request<B>, caller: Option<i64>) -> HandlerResult
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let user_id = require_user(caller)?;
        let input: FollowInputView = read_json(req).await?;

        let follows = self.services.follows.clone();
        let friend = blocking(move || follows.follow(user_id, &input.username)).await?;
        Ok(response::created(&friend))
    }

    async fn handle_unfollow(&self, caller: Option<i64>, target: &str) -> HandlerResult {
        let target_id = parse_id(target, "user id")?;
        let user_id = require_user(caller)?;

        let follows = self.services.follows.clone();
        blocking(move || follows.unfollow(user_id, target_id)).await?;
        Ok(response::no_content())
    }

    async fn handle_friends(&self, caller: Option<i64>) -> HandlerResult {
        let user_id = require_user(caller)?;

        let follows = self.services.follows.clone();
        let list = blocking(move || follows.friends_list(user_id)).await?;
        Ok(response::ok(&list))
    }

    async fn handle_followers(&self, caller: Option<i64>) -> HandlerResult {
        let user_id = require_user(caller)?;

        let follows = self.services.follows.clone();
        let followers = blocking(move || follows.list_followers(user_id)).await?;
        Ok(response::ok(&serde_json::json!({
            "userId": user_id,
            "totalFollowers": followers.len(),
            "followers": followers,
        })))
    }

    async fn handle_follow_status(&self, caller: Option<i64>, target: &str) -> HandlerResult {
        let target_id = parse_id(target, "user id")?;
        let user_id = require_user(caller)?;

        let follows = self.services.follows.clone();
        let status = blocking(move || follows.status(user_id, target_id)).await?;
        Ok(response::ok(&status))
    }

    async fn handle_activity(
        &self,
        caller: Option<i64>,
        target: &str,
        query: &str,
    ) -> HandlerResult {
        let target_id = parse_id(target, "user id")?;
        let user_id = require_user(caller)?;
        let query: ActivityQuery = serde_urlencoded::from_str(query)
            .map_err(|e| SocialError::InvalidArgument(format!("Invalid query: {}", e)))?;

        let activity = self.services.activity.clone();
        let feed = blocking(move || activity.get_activity(user_id, target_id, query.limit)).await?;
        Ok(response::ok(&feed))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn resolve_caller(&self, token: Option<String>) -> Result<Option<i64>, SocialError> {
        if token.is_none() {
            return Ok(None);
        }

        let identity = self.identity.clone();
        blocking(move || identity.resolve(token.as_deref())).await
    }
}

/// Run a synchronous service call off the async runtime
async fn blocking<F, T>(f: F) -> Result<T, SocialError>
where
    F: FnOnce() -> Result<T, SocialError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SocialError::Internal(format!("Blocking task failed: {}", e)))?
}

fn parse_id(raw: &str, what: &str) -> Result<i64, SocialError> {
    raw.parse::<i64>()
        .map_err(|_| SocialError::InvalidArgument(format!("Invalid {}: {}", what, raw)))
}

async fn read_json<B, T>(req: Request<B>) -> Result<T, SocialError>
where
    B: Body,
    B::Error: std::fmt::Display,
    T: DeserializeOwned,
{
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| SocialError::InvalidArgument(format!("Failed to read body: {}", e)))?
        .to_bytes();
    Ok(serde_json::from_slice(&body)?)
}
