//! Core domain logic for the reddit clone's community features.
//! This crate owns subreddits, posts, memberships and their storage.

pub mod db;
pub mod dto;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use dto::{PostRequest, PostResponse, SubredditDto};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::post::{NewPost, Post, PostId};
pub use model::subreddit::{NewSubreddit, Subreddit, SubredditId};
pub use model::user::{NewUser, User, UserId};
pub use model::ValidationError;
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::subreddit_repo::{SqliteSubredditRepository, SubredditRepository};
pub use repo::tx::{Repositories, SqliteTransactionManager, TransactionManager};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::auth_service::{AuthError, AuthService, CurrentUserResolver};
pub use service::post_service::{PostMapper, PostResponseMapper, PostService, PostServiceError};
pub use service::subreddit_service::{
    SubredditService, SubredditServiceError, SubredditServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
