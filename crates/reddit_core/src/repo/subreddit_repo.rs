//! Subreddit repository contract and SQLite implementation.
//!
//! # Invariants
//! - `post_ids` are loaded oldest first (`created_at ASC, rowid ASC`).
//! - Listing order is `created_at ASC, rowid ASC`: creation order, with
//!   insertion order breaking ties inside one millisecond.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, NOW_EPOCH_MS_SQL};
use crate::model::post::PostId;
use crate::model::subreddit::{NewSubreddit, Subreddit, SubredditId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SUBREDDIT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    created_at,
    owner_uuid
FROM subreddits";

/// Repository interface for subreddits.
pub trait SubredditRepository {
    /// Lists every subreddit with its post collection.
    fn find_all(&self) -> RepoResult<Vec<Subreddit>>;
    fn find_by_id(&self, id: SubredditId) -> RepoResult<Option<Subreddit>>;
    /// Exact, case-sensitive name lookup.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Subreddit>>;
    /// Inserts a subreddit stamped with the current time and reads it back.
    fn save(&self, subreddit: &NewSubreddit) -> RepoResult<Subreddit>;
}

/// SQLite-backed subreddit repository.
pub struct SqliteSubredditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubredditRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::new(conn))
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, sql: &str, key: &str) -> RepoResult<Option<Subreddit>> {
        let found = self
            .conn
            .query_row(sql, [key], SubredditRow::read)
            .optional()?;
        found.map(|row| row.load(self.conn)).transpose()
    }
}

impl SubredditRepository for SqliteSubredditRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Subreddit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBREDDIT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut subreddits = Vec::new();
        while let Some(row) = rows.next()? {
            subreddits.push(SubredditRow::read(row)?.load(self.conn)?);
        }
        Ok(subreddits)
    }

    fn find_by_id(&self, id: SubredditId) -> RepoResult<Option<Subreddit>> {
        self.find_one(
            &format!("{SUBREDDIT_SELECT_SQL} WHERE uuid = ?1;"),
            &id.to_string(),
        )
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Subreddit>> {
        self.find_one(&format!("{SUBREDDIT_SELECT_SQL} WHERE name = ?1;"), name)
    }

    fn save(&self, subreddit: &NewSubreddit) -> RepoResult<Subreddit> {
        subreddit.validate()?;

        self.conn.execute(
            &format!(
                "INSERT INTO subreddits (
                    uuid,
                    name,
                    description,
                    created_at,
                    owner_uuid
                ) VALUES (?1, ?2, ?3, {NOW_EPOCH_MS_SQL}, ?4);"
            ),
            params![
                subreddit.id.to_string(),
                subreddit.name.as_str(),
                subreddit.description.as_str(),
                subreddit.owner_id.to_string(),
            ],
        )?;

        self.find_by_id(subreddit.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "subreddit {} missing after insert",
                subreddit.id
            ))
        })
    }
}

/// Raw columns of one `subreddits` row, before posts are attached.
struct SubredditRow {
    uuid: String,
    name: String,
    description: String,
    created_at: i64,
    owner_uuid: String,
}

impl SubredditRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
            owner_uuid: row.get("owner_uuid")?,
        })
    }

    fn load(self, conn: &Connection) -> RepoResult<Subreddit> {
        let post_ids = load_post_ids(conn, &self.uuid)?;
        Ok(Subreddit {
            id: parse_uuid(&self.uuid, "subreddits.uuid")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            owner_id: parse_uuid(&self.owner_uuid, "subreddits.owner_uuid")?,
            post_ids,
        })
    }
}

fn load_post_ids(conn: &Connection, subreddit_uuid: &str) -> RepoResult<Vec<PostId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM posts
         WHERE subreddit_uuid = ?1
         ORDER BY created_at ASC, rowid ASC;",
    )?;
    let mut rows = stmt.query([subreddit_uuid])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "posts.uuid")?);
    }
    Ok(ids)
}
