//! Persisted domain entities.
//!
//! # Responsibility
//! - Define the canonical shapes of users, subreddits and posts.
//! - Own the field-level validation run before every repository write.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID generated in core.
//! - Timestamps are epoch milliseconds stamped by storage at insert time.

use thiserror::Error;

pub mod post;
pub mod subreddit;
pub mod user;

/// Field-level validation failure for entity writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("community name is required")]
    BlankSubredditName,
    #[error("community description is required")]
    BlankSubredditDescription,
    #[error("post name cannot be empty")]
    BlankPostName,
    #[error("username is required")]
    BlankUsername,
    #[error("email is required")]
    BlankEmail,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
