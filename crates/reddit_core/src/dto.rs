//! Transfer records shaping service inputs and outputs.
//!
//! # Responsibility
//! - Decouple caller-facing shapes from persisted entity shapes.
//! - Keep the camelCase JSON field naming used by web clients.
//!
//! # Invariants
//! - Records are built per request and carry no storage handles.

use crate::model::post::PostId;
use crate::model::subreddit::{Subreddit, SubredditId};
use serde::{Deserialize, Serialize};

/// Subreddit summary used for listing, creation and joining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditDto {
    /// `None` until the subreddit has been persisted.
    pub id: Option<SubredditId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub post_count: usize,
}

impl SubredditDto {
    /// Builds an unsaved creation request.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            post_count: 0,
        }
    }
}

impl From<&Subreddit> for SubredditDto {
    fn from(subreddit: &Subreddit) -> Self {
        Self {
            id: Some(subreddit.id),
            name: subreddit.name.clone(),
            description: subreddit.description.clone(),
            post_count: subreddit.post_count(),
        }
    }
}

/// Caller input for creating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub subreddit_name: String,
    pub post_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Post as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: PostId,
    pub post_name: String,
    pub url: Option<String>,
    pub description: String,
    pub user_name: String,
    pub subreddit_name: String,
    pub vote_count: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{PostRequest, SubredditDto};
    use serde_json::json;

    #[test]
    fn subreddit_dto_uses_camel_case_on_the_wire() {
        let dto = SubredditDto {
            post_count: 3,
            ..SubredditDto::new("rust", "crabs")
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            value,
            json!({"id": null, "name": "rust", "description": "crabs", "postCount": 3})
        );
    }

    #[test]
    fn post_request_defaults_optional_fields() {
        let request: PostRequest =
            serde_json::from_value(json!({"subredditName": "rust", "postName": "hello"})).unwrap();
        assert_eq!(request.url, None);
        assert!(request.description.is_empty());
    }
}
