//! User lookups
//!
//! Users are owned by the auth service. This module only resolves ids and
//! usernames; `create_user` exists for seeding and tests.

use diesel::prelude::*;

use super::diesel_schema::users;
use super::last_insert_rowid;
use super::models::{current_timestamp, NewUser, User};
use crate::error::SocialError;

/// Get user by ID
pub fn get_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>, SocialError> {
    users::table
        .filter(users::id.eq(user_id))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Resolve a username to its user row
pub fn find_user_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, SocialError> {
    users::table
        .filter(users::username.eq(username))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|e| SocialError::db("Query", e))
}

/// Insert a user mirror row
pub fn create_user(conn: &mut SqliteConnection, username: &str) -> Result<User, SocialError> {
    if username.trim().is_empty() {
        return Err(SocialError::InvalidArgument("username is required".into()));
    }

    let now = current_timestamp();
    diesel::insert_into(users::table)
        .values(&NewUser {
            username,
            created_at: &now,
        })
        .execute(conn)
        .map_err(|e| SocialError::db("Insert user", e))?;

    let id: i64 = diesel::select(last_insert_rowid())
        .get_result(conn)
        .map_err(|e| SocialError::db("Read user id", e))?;

    get_user(conn, id)?
        .ok_or_else(|| SocialError::Internal("Failed to retrieve created user".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SocialDb;
    use crate::error::ErrorKind;

    #[test]
    fn test_create_and_resolve() {
        let db = SocialDb::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let alice = create_user(conn, "alice")?;
            let found = find_user_by_username(conn, "alice")?.unwrap();
            assert_eq!(found.id, alice.id);
            assert!(get_user(conn, alice.id + 1)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = SocialDb::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                create_user(conn, "alice")?;
                create_user(conn, "alice")
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
}
