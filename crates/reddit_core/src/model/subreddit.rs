//! Subreddit entity.
//!
//! # Invariants
//! - `name` is unique across storage (schema constraint, not checked here).
//! - A subreddit always has an owning user.

use super::post::PostId;
use super::user::UserId;
use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a subreddit.
pub type SubredditId = Uuid;

/// A named community container for posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subreddit {
    pub id: SubredditId,
    pub name: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub owner_id: UserId,
    /// Posts owned by this subreddit, oldest first.
    pub post_ids: Vec<PostId>,
}

impl Subreddit {
    /// Number of posts currently owned by this subreddit.
    pub fn post_count(&self) -> usize {
        self.post_ids.len()
    }
}

/// Insert shape for a subreddit that has no storage row yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubreddit {
    pub id: SubredditId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
}

impl NewSubreddit {
    /// Builds an insert record with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner_id: UserId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            owner_id,
        }
    }

    /// Checks the non-blank constraints on name and description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::BlankSubredditName);
        }
        if is_blank(&self.description) {
            return Err(ValidationError::BlankSubredditDescription);
        }
        Ok(())
    }
}
