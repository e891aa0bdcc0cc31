//! Caller identity
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user id in a trusted header; this module turns that header into a user id
//! that is known to exist.

use std::sync::Arc;

use tracing::debug;

use crate::db::{users, SocialDb};
use crate::error::SocialError;

/// Resolves the raw identity token of a request to a user id
pub trait IdentityResolver: Send + Sync {
    /// Header the token is read from
    fn header_name(&self) -> &str;

    /// `Ok(None)` means anonymous: no token, an unparsable token, or an
    /// unknown user.
    fn resolve(&self, token: Option<&str>) -> Result<Option<i64>, SocialError>;
}

/// Trusts the user id in a gateway-set header, after checking the user exists
pub struct TrustedHeaderResolver {
    db: Arc<SocialDb>,
    header: String,
}

impl TrustedHeaderResolver {
    pub fn new(db: Arc<SocialDb>, header: impl Into<String>) -> Self {
        Self {
            db,
            header: header.into().to_ascii_lowercase(),
        }
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn header_name(&self) -> &str {
        &self.header
    }

    fn resolve(&self, token: Option<&str>) -> Result<Option<i64>, SocialError> {
        let Some(raw) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let Ok(user_id) = raw.parse::<i64>() else {
            debug!(token = raw, "Ignoring malformed identity header");
            return Ok(None);
        };

        let user = self.db.with_conn(|conn| users::get_user(conn, user_id))?;
        Ok(user.map(|u| u.id))
    }
}

/// Turn an optional caller into a required one
pub fn require_user(caller: Option<i64>) -> Result<i64, SocialError> {
    caller.ok_or_else(|| SocialError::Unauthenticated("Authentication required".into()))
}
