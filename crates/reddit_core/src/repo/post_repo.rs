//! Post repository contract and SQLite implementation.
//!
//! # Invariants
//! - Every returned `Post` carries its author and subreddit names.
//! - Per-subreddit listing order is `created_at ASC, rowid ASC`.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, NOW_EPOCH_MS_SQL};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::subreddit::SubredditId;
use rusqlite::{params, Connection, Row};

const POST_SELECT_SQL: &str = "SELECT
    p.uuid AS uuid,
    p.post_name AS post_name,
    p.url AS url,
    p.description AS description,
    p.vote_count AS vote_count,
    p.created_at AS created_at,
    p.author_uuid AS author_uuid,
    u.username AS author_name,
    p.subreddit_uuid AS subreddit_uuid,
    s.name AS subreddit_name
FROM posts p
INNER JOIN users u ON u.uuid = p.author_uuid
INNER JOIN subreddits s ON s.uuid = p.subreddit_uuid";

/// Repository interface for posts.
pub trait PostRepository {
    /// Lists every post owned by `subreddit_id`, oldest first.
    fn find_all_by_subreddit(&self, subreddit_id: SubredditId) -> RepoResult<Vec<Post>>;
    fn find_by_id(&self, id: PostId) -> RepoResult<Option<Post>>;
    /// Inserts a post stamped with the current time and reads it back.
    fn save(&self, post: &NewPost) -> RepoResult<Post>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::new(conn))
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn find_all_by_subreddit(&self, subreddit_id: SubredditId) -> RepoResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "{POST_SELECT_SQL}
             WHERE p.subreddit_uuid = ?1
             ORDER BY p.created_at ASC, p.rowid ASC;"
        ))?;
        let mut rows = stmt.query([subreddit_id.to_string()])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn find_by_id(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE p.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_post_row(row)?));
        }
        Ok(None)
    }

    fn save(&self, post: &NewPost) -> RepoResult<Post> {
        post.validate()?;

        self.conn.execute(
            &format!(
                "INSERT INTO posts (
                    uuid,
                    post_name,
                    url,
                    description,
                    vote_count,
                    created_at,
                    author_uuid,
                    subreddit_uuid
                ) VALUES (?1, ?2, ?3, ?4, 0, {NOW_EPOCH_MS_SQL}, ?5, ?6);"
            ),
            params![
                post.id.to_string(),
                post.post_name.as_str(),
                post.url.as_deref(),
                post.description.as_str(),
                post.author_id.to_string(),
                post.subreddit_id.to_string(),
            ],
        )?;

        self.find_by_id(post.id)?
            .ok_or_else(|| RepoError::InvalidData(format!("post {} missing after insert", post.id)))
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let uuid: String = row.get("uuid")?;
    let author_uuid: String = row.get("author_uuid")?;
    let subreddit_uuid: String = row.get("subreddit_uuid")?;

    Ok(Post {
        id: parse_uuid(&uuid, "posts.uuid")?,
        post_name: row.get("post_name")?,
        url: row.get("url")?,
        description: row.get("description")?,
        vote_count: row.get("vote_count")?,
        created_at: row.get("created_at")?,
        author_id: parse_uuid(&author_uuid, "posts.author_uuid")?,
        author_name: row.get("author_name")?,
        subreddit_id: parse_uuid(&subreddit_uuid, "posts.subreddit_uuid")?,
        subreddit_name: row.get("subreddit_name")?,
    })
}
