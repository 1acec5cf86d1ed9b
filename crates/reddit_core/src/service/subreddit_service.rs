//! Subreddit use-case service.
//!
//! # Responsibility
//! - List subreddits and their posts.
//! - Create subreddits owned by the current user.
//! - Add subreddits to the current user's membership set.
//!
//! # Invariants
//! - Listing operations run in read-only scopes; create/join in read-write.
//! - An unknown subreddit id always yields `SubredditNotFound` and no write.
//! - Joining an already joined subreddit leaves one membership row.

use super::auth_service::{AuthError, CurrentUserResolver};
use super::post_service::{PostMapper, PostResponseMapper};
use crate::dto::{PostResponse, SubredditDto};
use crate::model::post::Post;
use crate::model::subreddit::{NewSubreddit, Subreddit, SubredditId};
use crate::model::user::UserId;
use crate::repo::tx::{Repositories, TransactionManager};
use crate::repo::RepoError;
use log::{debug, info};
use thiserror::Error;

/// Errors from subreddit use-cases.
#[derive(Debug, Error)]
pub enum SubredditServiceError {
    /// Requested subreddit id does not resolve.
    #[error("Subreddit not found with id - {0}")]
    SubredditNotFound(SubredditId),
    /// Current user could not be resolved.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Persistence-layer failure.
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type SubredditServiceResult<T> = Result<T, SubredditServiceError>;

/// Subreddit service facade.
///
/// `M` scopes transactions, `A` resolves the acting user and `P` maps posts
/// into responses.
pub struct SubredditService<M, A, P = PostResponseMapper> {
    manager: M,
    auth: A,
    post_mapper: P,
}

impl<M: TransactionManager, A: CurrentUserResolver> SubredditService<M, A> {
    /// Creates a service using the default post mapper.
    pub fn new(manager: M, auth: A) -> Self {
        Self::with_post_mapper(manager, auth, PostResponseMapper)
    }
}

impl<M, A, P> SubredditService<M, A, P>
where
    M: TransactionManager,
    A: CurrentUserResolver,
    P: PostMapper,
{
    pub fn with_post_mapper(manager: M, auth: A, post_mapper: P) -> Self {
        Self {
            manager,
            auth,
            post_mapper,
        }
    }

    /// Lists every subreddit as a summary carrying its post count.
    pub fn get_all(&mut self) -> SubredditServiceResult<Vec<SubredditDto>> {
        let subreddits = self
            .manager
            .read_only(|repos| -> SubredditServiceResult<Vec<Subreddit>> {
                Ok(repos.subreddits().find_all()?)
            })?;

        debug!(
            "event=subreddit_list module=service status=ok count={}",
            subreddits.len()
        );
        Ok(subreddits.iter().map(SubredditDto::from).collect())
    }

    /// Gets one subreddit summary by id.
    pub fn get_subreddit(&mut self, id: SubredditId) -> SubredditServiceResult<SubredditDto> {
        let subreddit = self
            .manager
            .read_only(|repos| -> SubredditServiceResult<Subreddit> { find_required(repos, id) })?;
        Ok(SubredditDto::from(&subreddit))
    }

    /// Lists every post of subreddit `id` through the post mapper.
    pub fn get_all_posts(&mut self, id: SubredditId) -> SubredditServiceResult<Vec<PostResponse>> {
        let posts = self
            .manager
            .read_only(|repos| -> SubredditServiceResult<Vec<Post>> {
                let subreddit = find_required(repos, id)?;
                Ok(repos.posts().find_all_by_subreddit(subreddit.id)?)
            })?;

        debug!(
            "event=subreddit_posts module=service status=ok subreddit_id={id} count={}",
            posts.len()
        );
        Ok(posts
            .into_iter()
            .map(|post| self.post_mapper.map_to_dto(post))
            .collect())
    }

    /// Persists a new subreddit owned by the current user.
    ///
    /// Returns `dto` with the generated id attached. Duplicate names fail
    /// with the storage constraint error.
    pub fn save(&mut self, mut dto: SubredditDto) -> SubredditServiceResult<SubredditDto> {
        let auth = &self.auth;
        let saved = self
            .manager
            .read_write(|repos| -> SubredditServiceResult<Subreddit> {
                let owner = auth.current_user(repos.users())?;
                let new_subreddit =
                    NewSubreddit::new(dto.name.as_str(), dto.description.as_str(), owner.id);
                Ok(repos.subreddits().save(&new_subreddit)?)
            })?;

        info!(
            "event=subreddit_create module=service status=ok subreddit_id={} owner_id={}",
            saved.id, saved.owner_id
        );
        dto.id = Some(saved.id);
        Ok(dto)
    }

    /// Adds subreddit `id` to the current user's memberships.
    pub fn join_subreddit(&mut self, id: SubredditId) -> SubredditServiceResult<()> {
        let auth = &self.auth;
        let (user_id, newly_joined) =
            self.manager
                .read_write(|repos| -> SubredditServiceResult<(UserId, bool)> {
                    let mut user = auth.current_user(repos.users())?;
                    let subreddit = find_required(repos, id)?;
                    let newly_joined = user.join(subreddit.id);
                    repos.users().save(&user)?;
                    Ok((user.id, newly_joined))
                })?;

        info!(
            "event=subreddit_join module=service status=ok subreddit_id={id} user_id={user_id} already_member={}",
            !newly_joined
        );
        Ok(())
    }
}

fn find_required(repos: &dyn Repositories, id: SubredditId) -> SubredditServiceResult<Subreddit> {
    repos
        .subreddits()
        .find_by_id(id)?
        .ok_or(SubredditServiceError::SubredditNotFound(id))
}
