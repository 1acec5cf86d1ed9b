//! Explicit transaction scoping over the repository contracts.
//!
//! # Responsibility
//! - Open one storage transaction per service operation.
//! - Hand the operation a repository view bound to that transaction.
//!
//! # Invariants
//! - A scope commits only when its work returns `Ok`; otherwise it rolls back.
//! - Read-only scopes reject writes for their whole duration.
//! - Read-write scopes take the write lock up front (`IMMEDIATE`).

use super::post_repo::{PostRepository, SqlitePostRepository};
use super::subreddit_repo::{SqliteSubredditRepository, SubredditRepository};
use super::user_repo::{SqliteUserRepository, UserRepository};
use super::{ensure_connection_ready, RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

/// Repository set visible inside one transaction scope.
pub trait Repositories {
    fn subreddits(&self) -> &dyn SubredditRepository;
    fn posts(&self) -> &dyn PostRepository;
    fn users(&self) -> &dyn UserRepository;
}

/// Runs units of work inside atomic storage transactions.
pub trait TransactionManager {
    /// Runs `work` in a transaction that refuses writes.
    fn read_only<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>;

    /// Runs `work` in a transaction that may write.
    fn read_write<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>;
}

impl<M: TransactionManager> TransactionManager for &mut M {
    fn read_only<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).read_only(work)
    }

    fn read_write<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).read_write(work)
    }
}

/// SQLite repositories bound to one open transaction.
struct SqliteRepositories<'conn> {
    subreddits: SqliteSubredditRepository<'conn>,
    posts: SqlitePostRepository<'conn>,
    users: SqliteUserRepository<'conn>,
}

impl<'conn> SqliteRepositories<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            subreddits: SqliteSubredditRepository::new(conn),
            posts: SqlitePostRepository::new(conn),
            users: SqliteUserRepository::new(conn),
        }
    }
}

impl Repositories for SqliteRepositories<'_> {
    fn subreddits(&self) -> &dyn SubredditRepository {
        &self.subreddits
    }

    fn posts(&self) -> &dyn PostRepository {
        &self.posts
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxMode {
    ReadOnly,
    ReadWrite,
}

impl TxMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Self::ReadOnly => TransactionBehavior::Deferred,
            Self::ReadWrite => TransactionBehavior::Immediate,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::ReadWrite => "read_write",
        }
    }
}

/// Transaction manager over one exclusively borrowed SQLite connection.
pub struct SqliteTransactionManager<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTransactionManager<'conn> {
    /// Wraps a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn run<T, E, F>(&mut self, mode: TxMode, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>,
    {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(mode.behavior())
            .map_err(db_error::<E>)?;

        let result = {
            let query_only = match mode {
                TxMode::ReadOnly => Some(QueryOnlyGuard::enable(&tx).map_err(db_error::<E>)?),
                TxMode::ReadWrite => None,
            };

            let result = work(&SqliteRepositories::new(&tx));

            if let Some(guard) = query_only {
                guard.release().map_err(db_error::<E>)?;
            }
            result
        };

        match result {
            Ok(value) => {
                tx.commit().map_err(db_error::<E>)?;
                debug!(
                    "event=tx_end module=repo status=commit mode={} duration_ms={}",
                    mode.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                drop(tx);
                debug!(
                    "event=tx_end module=repo status=rollback mode={} duration_ms={}",
                    mode.as_str(),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

impl TransactionManager for SqliteTransactionManager<'_> {
    fn read_only<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>,
    {
        self.run(TxMode::ReadOnly, work)
    }

    fn read_write<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Repositories) -> Result<T, E>,
        E: From<RepoError>,
    {
        self.run(TxMode::ReadWrite, work)
    }
}

/// Keeps `PRAGMA query_only` on for its lifetime.
///
/// The pragma is connection-wide and survives the transaction, so it must be
/// switched off again even when the scope unwinds.
struct QueryOnlyGuard<'tx> {
    conn: &'tx Connection,
    active: bool,
}

impl<'tx> QueryOnlyGuard<'tx> {
    fn enable(conn: &'tx Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "query_only", true)?;
        Ok(Self { conn, active: true })
    }

    fn release(mut self) -> rusqlite::Result<()> {
        self.active = false;
        self.conn.pragma_update(None, "query_only", false)
    }
}

impl Drop for QueryOnlyGuard<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.conn.pragma_update(None, "query_only", false) {
            warn!("event=tx_query_only_reset module=repo status=error error={err}");
        }
    }
}

fn db_error<E: From<RepoError>>(err: rusqlite::Error) -> E {
    E::from(RepoError::from(err))
}
