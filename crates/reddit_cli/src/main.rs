//! Command-line front end over `reddit_core`.
//!
//! # Responsibility
//! - Map subcommands onto core service operations against one database file.
//! - Print results as JSON on stdout and failures on stderr.

use clap::{Parser, Subcommand};
use log::info;
use reddit_core::db::{open_db, DbError};
use reddit_core::{
    default_log_level, init_logging, AuthError, AuthService, LoggingError, PostRequest,
    PostService, PostServiceError, RepoError, SqliteTransactionManager, SubredditDto,
    SubredditService, SubredditServiceError,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_DB_PATH: &str = "reddit.sqlite3";
const DEFAULT_STDERR_LOG_LEVEL: &str = "warn";

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version, about = "Manage subreddits, posts and memberships", long_about = None)]
struct Config {
    /// SQLite database file, created on first use
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Act as this user
    #[arg(short, long, value_name = "USERNAME")]
    user: Option<String>,

    /// One of trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Write rotating log files to this absolute directory instead of stderr
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Config {
    fn log_level(&self) -> &str {
        match (&self.log_level, &self.log_dir) {
            (Some(level), _) => level.as_str(),
            (None, Some(_)) => default_log_level(),
            (None, None) => DEFAULT_STDERR_LOG_LEVEL,
        }
    }

    fn auth(&self) -> AuthService {
        match &self.user {
            Some(username) => AuthService::authenticated(username.as_str()),
            None => AuthService::anonymous(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a user
    Signup { username: String, email: String },

    /// List all subreddits with their post counts
    #[command(alias = "ls")]
    Subreddits,

    /// Show one subreddit
    Subreddit { id: Uuid },

    /// Create a subreddit owned by --user
    Create { name: String, description: String },

    /// Join a subreddit as --user
    Join { id: Uuid },

    /// List the posts of a subreddit
    Posts { id: Uuid },

    /// Submit a post to a subreddit as --user
    Post {
        /// Subreddit name
        subreddit: String,

        /// Post title
        title: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Subreddit(#[from] SubredditServiceError),
    #[error(transparent)]
    Post(#[from] PostServiceError),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let config = Config::parse();
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), CliError> {
    init_logging(config.log_level(), config.log_dir.as_deref())?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        reddit_core::core_version()
    );

    let mut conn = open_db(&config.db)?;
    let manager = SqliteTransactionManager::try_new(&mut conn)?;
    let auth = config.auth();

    match config.command {
        Command::Signup { username, email } => {
            print_json(&AuthService::signup(manager, username, email)?)
        }
        Command::Subreddits => {
            let mut service = SubredditService::new(manager, auth);
            print_json(&service.get_all()?)
        }
        Command::Subreddit { id } => {
            let mut service = SubredditService::new(manager, auth);
            print_json(&service.get_subreddit(id)?)
        }
        Command::Create { name, description } => {
            let mut service = SubredditService::new(manager, auth);
            print_json(&service.save(SubredditDto::new(name, description))?)
        }
        Command::Join { id } => {
            let mut service = SubredditService::new(manager, auth);
            service.join_subreddit(id)?;
            print_json(&service.get_subreddit(id)?)
        }
        Command::Posts { id } => {
            let mut service = SubredditService::new(manager, auth);
            print_json(&service.get_all_posts(id)?)
        }
        Command::Post {
            subreddit,
            title,
            url,
            description,
        } => {
            let mut service = PostService::new(manager, auth);
            let request = PostRequest {
                subreddit_name: subreddit,
                post_name: title,
                url,
                description,
            };
            print_json(&service.save(&request)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
