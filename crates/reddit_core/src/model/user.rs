//! User entity and subreddit membership.
//!
//! # Invariants
//! - `subreddits` is a set: joining the same subreddit twice is a no-op.
//! - Usernames are unique ignoring ASCII case (schema constraint).

use super::subreddit::SubredditId;
use super::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of a user.
pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Joined subreddits.
    pub subreddits: BTreeSet<SubredditId>,
}

impl User {
    /// Adds `subreddit_id` to the membership set.
    ///
    /// Returns `false` when the user was already a member.
    pub fn join(&mut self, subreddit_id: SubredditId) -> bool {
        self.subreddits.insert(subreddit_id)
    }

    pub fn is_member_of(&self, subreddit_id: SubredditId) -> bool {
        self.subreddits.contains(&subreddit_id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identity(&self.username, &self.email)
    }
}

/// Insert shape for a user registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identity(&self.username, &self.email)
    }
}

fn validate_identity(username: &str, email: &str) -> Result<(), ValidationError> {
    if is_blank(username) {
        return Err(ValidationError::BlankUsername);
    }
    if is_blank(email) {
        return Err(ValidationError::BlankEmail);
    }
    Ok(())
}
