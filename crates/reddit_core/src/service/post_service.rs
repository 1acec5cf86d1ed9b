//! Post use-case service and post-to-response mapping.
//!
//! # Responsibility
//! - Map persisted posts into caller-facing `PostResponse` records.
//! - Create posts in a named subreddit on behalf of the current user.

use super::auth_service::{AuthError, CurrentUserResolver};
use crate::dto::{PostRequest, PostResponse};
use crate::model::post::{NewPost, Post, PostId};
use crate::repo::tx::TransactionManager;
use crate::repo::RepoError;
use log::info;
use thiserror::Error;

/// Errors from post use-cases.
#[derive(Debug, Error)]
pub enum PostServiceError {
    /// No subreddit carries the requested name.
    #[error("subreddit not found: {0}")]
    SubredditNotFound(String),
    #[error("post not found: {0}")]
    PostNotFound(PostId),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Maps persisted posts to response records.
pub trait PostMapper {
    fn map_to_dto(&self, post: Post) -> PostResponse;
}

/// Field-for-field post mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostResponseMapper;

impl PostMapper for PostResponseMapper {
    fn map_to_dto(&self, post: Post) -> PostResponse {
        PostResponse {
            id: post.id,
            post_name: post.post_name,
            url: post.url,
            description: post.description,
            user_name: post.author_name,
            subreddit_name: post.subreddit_name,
            vote_count: post.vote_count,
            created_at: post.created_at,
        }
    }
}

/// Post service facade.
pub struct PostService<M, A> {
    manager: M,
    auth: A,
    mapper: PostResponseMapper,
}

impl<M: TransactionManager, A: CurrentUserResolver> PostService<M, A> {
    pub fn new(manager: M, auth: A) -> Self {
        Self {
            manager,
            auth,
            mapper: PostResponseMapper,
        }
    }

    /// Creates a post in `request.subreddit_name` authored by the current user.
    pub fn save(&mut self, request: &PostRequest) -> Result<PostResponse, PostServiceError> {
        let auth = &self.auth;
        let post = self.manager.read_write(|repos| -> Result<Post, PostServiceError> {
            let subreddit = repos
                .subreddits()
                .find_by_name(&request.subreddit_name)?
                .ok_or_else(|| PostServiceError::SubredditNotFound(request.subreddit_name.clone()))?;
            let author = auth.current_user(repos.users())?;

            let mut new_post = NewPost::new(request.post_name.as_str(), author.id, subreddit.id);
            new_post.url = request.url.clone();
            new_post.description = request.description.clone();
            Ok(repos.posts().save(&new_post)?)
        })?;

        info!(
            "event=post_create module=service status=ok post_id={} subreddit_id={}",
            post.id, post.subreddit_id
        );
        Ok(self.mapper.map_to_dto(post))
    }

    /// Gets one post by id.
    pub fn get_post(&mut self, id: PostId) -> Result<PostResponse, PostServiceError> {
        let post = self.manager.read_only(|repos| -> Result<Post, PostServiceError> {
            repos
                .posts()
                .find_by_id(id)?
                .ok_or(PostServiceError::PostNotFound(id))
        })?;
        Ok(self.mapper.map_to_dto(post))
    }
}

#[cfg(test)]
mod tests {
    use super::{PostMapper, PostResponseMapper};
    use crate::model::post::Post;
    use uuid::Uuid;

    #[test]
    fn mapper_copies_names_from_owners() {
        let post = Post {
            id: Uuid::new_v4(),
            post_name: "hello".to_string(),
            url: Some("https://example.com".to_string()),
            description: "first".to_string(),
            vote_count: 7,
            created_at: 1_000,
            author_id: Uuid::new_v4(),
            author_name: "alice".to_string(),
            subreddit_id: Uuid::new_v4(),
            subreddit_name: "rust".to_string(),
        };

        let response = PostResponseMapper.map_to_dto(post.clone());
        assert_eq!(response.id, post.id);
        assert_eq!(response.user_name, "alice");
        assert_eq!(response.subreddit_name, "rust");
        assert_eq!(response.vote_count, 7);
        assert_eq!(response.url.as_deref(), Some("https://example.com"));
    }
}
