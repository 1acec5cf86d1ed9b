//! Current-user resolution and registration.
//!
//! # Invariants
//! - The principal is resolved against storage inside the caller's
//!   transaction, so the returned `User` reflects that transaction's view.
//! - A blank principal name is treated as anonymous.

use crate::model::user::{NewUser, User};
use crate::repo::tx::TransactionManager;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::info;
use thiserror::Error;

/// Errors from current-user resolution and signup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Operation requires a logged-in user.
    #[error("no authenticated user")]
    NotAuthenticated,
    /// Principal name does not match a stored user.
    #[error("User name not found - {0}")]
    UserNotFound(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Resolves the user on whose behalf an operation runs.
pub trait CurrentUserResolver {
    fn current_user(&self, users: &dyn UserRepository) -> Result<User, AuthError>;
}

/// Principal-holding authentication context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthService {
    principal: Option<String>,
}

impl AuthService {
    /// Context with no logged-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for the user named `username`.
    pub fn authenticated(username: impl Into<String>) -> Self {
        let username = username.into();
        let trimmed = username.trim();
        Self {
            principal: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.principal.is_some()
    }

    /// Registers a new user in its own read-write transaction.
    pub fn signup<M: TransactionManager>(
        mut manager: M,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<User, AuthError> {
        let new_user = NewUser::new(username, email);
        let user = manager.read_write(|repos| -> Result<User, AuthError> {
            Ok(repos.users().create_user(&new_user)?)
        })?;
        info!(
            "event=user_signup module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }
}

impl CurrentUserResolver for AuthService {
    fn current_user(&self, users: &dyn UserRepository) -> Result<User, AuthError> {
        let username = self.principal().ok_or(AuthError::NotAuthenticated)?;
        users
            .find_by_username(username)?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))
    }
}
