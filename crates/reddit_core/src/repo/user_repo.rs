//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist users and their subreddit membership set.
//!
//! # Invariants
//! - `save` makes the stored membership rows equal the in-memory set.
//! - `save` is atomic on its own: it runs under a savepoint, so it nests
//!   inside an open transaction and still rolls back partial writes.
//! - Username lookups ignore ASCII case.

use super::{
    ensure_connection_ready, parse_uuid, EntityKind, RepoError, RepoResult, NOW_EPOCH_MS_SQL,
};
use crate::model::subreddit::SubredditId;
use crate::model::user::{NewUser, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    email,
    created_at
FROM users";

const SAVE_SAVEPOINT: &str = "user_save";

/// Repository interface for users and memberships.
pub trait UserRepository {
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Inserts a new user with an empty membership set.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    /// Persists identity fields and the full membership set of `user`.
    ///
    /// Returns `NotFound` when no stored row matches `user.id`.
    fn save(&self, user: &User) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::new(conn))
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, sql: &str, key: &str) -> RepoResult<Option<User>> {
        let found = self.conn.query_row(sql, [key], UserRow::read).optional()?;
        found.map(|row| row.load(self.conn)).transpose()
    }

    fn save_in_savepoint(&self, user: &User) -> RepoResult<()> {
        let user_uuid = user.id.to_string();
        let changed = self.conn.execute(
            "UPDATE users
             SET
                username = ?2,
                email = ?3
             WHERE uuid = ?1;",
            params![user_uuid.as_str(), user.username.as_str(), user.email.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::User, user.id));
        }

        let stored = load_memberships(self.conn, &user_uuid)?;
        for stale in stored.difference(&user.subreddits) {
            self.conn.execute(
                "DELETE FROM user_subreddits
                 WHERE user_uuid = ?1 AND subreddit_uuid = ?2;",
                params![user_uuid.as_str(), stale.to_string()],
            )?;
        }
        for added in user.subreddits.difference(&stored) {
            self.conn.execute(
                "INSERT OR IGNORE INTO user_subreddits (user_uuid, subreddit_uuid)
                 VALUES (?1, ?2);",
                params![user_uuid.as_str(), added.to_string()],
            )?;
        }

        Ok(())
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_one(
            &format!("{USER_SELECT_SQL} WHERE uuid = ?1;"),
            &id.to_string(),
        )
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_one(
            &format!("{USER_SELECT_SQL} WHERE username = ?1 COLLATE NOCASE;"),
            username.trim(),
        )
    }

    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        self.conn.execute(
            &format!(
                "INSERT INTO users (uuid, username, email, created_at)
                 VALUES (?1, ?2, ?3, {NOW_EPOCH_MS_SQL});"
            ),
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
            ],
        )?;

        self.find_by_id(user.id)?
            .ok_or_else(|| RepoError::InvalidData(format!("user {} missing after insert", user.id)))
    }

    fn save(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        self.conn
            .execute_batch(&format!("SAVEPOINT {SAVE_SAVEPOINT};"))?;
        match self.save_in_savepoint(user) {
            Ok(()) => {
                self.conn
                    .execute_batch(&format!("RELEASE {SAVE_SAVEPOINT};"))?;
                Ok(())
            }
            Err(err) => {
                self.conn.execute_batch(&format!(
                    "ROLLBACK TO {SAVE_SAVEPOINT}; RELEASE {SAVE_SAVEPOINT};"
                ))?;
                Err(err)
            }
        }
    }
}

struct UserRow {
    uuid: String,
    username: String,
    email: String,
    created_at: i64,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            username: row.get("username")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        })
    }

    fn load(self, conn: &Connection) -> RepoResult<User> {
        let subreddits = load_memberships(conn, &self.uuid)?;
        Ok(User {
            id: parse_uuid(&self.uuid, "users.uuid")?,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
            subreddits,
        })
    }
}

fn load_memberships(conn: &Connection, user_uuid: &str) -> RepoResult<BTreeSet<SubredditId>> {
    let mut stmt = conn.prepare(
        "SELECT subreddit_uuid
         FROM user_subreddits
         WHERE user_uuid = ?1;",
    )?;
    let mut rows = stmt.query([user_uuid])?;
    let mut memberships = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        memberships.insert(parse_uuid(&value, "user_subreddits.subreddit_uuid")?);
    }
    Ok(memberships)
}
