//! Post entity.

use super::subreddit::SubredditId;
use super::user::UserId;
use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a post.
pub type PostId = Uuid;

/// Persisted post with owner names joined in for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub post_name: String,
    pub url: Option<String>,
    pub description: String,
    pub vote_count: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub author_id: UserId,
    /// Joined from `users.username`.
    pub author_name: String,
    pub subreddit_id: SubredditId,
    /// Joined from `subreddits.name`.
    pub subreddit_name: String,
}

/// Insert shape for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub id: PostId,
    pub post_name: String,
    pub url: Option<String>,
    pub description: String,
    pub author_id: UserId,
    pub subreddit_id: SubredditId,
}

impl NewPost {
    pub fn new(
        post_name: impl Into<String>,
        author_id: UserId,
        subreddit_id: SubredditId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_name: post_name.into(),
            url: None,
            description: String::new(),
            author_id,
            subreddit_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.post_name) {
            return Err(ValidationError::BlankPostName);
        }
        Ok(())
    }
}
