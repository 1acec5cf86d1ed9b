//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction scoping: one scope per public operation.
//! - Keep callers decoupled from storage details.

pub mod auth_service;
pub mod post_service;
pub mod subreddit_service;
