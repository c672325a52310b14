//! Stored documents and request payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use folio_content::Rendered;
use serde::{Deserialize, Serialize};

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Raw post markup.
    pub content: String,
    pub draft: bool,
    #[serde(default = "default_listed")]
    pub listed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published: DateTime<Utc>,
}

fn default_listed() -> bool {
    true
}

/// Body of `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub slug: String,
    pub draft: bool,
    pub published: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub listed: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl PostPayload {
    /// Turn a payload into the document stored under `id`.
    pub fn into_post(self, id: String) -> Post {
        Post {
            id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            draft: self.draft,
            listed: self.listed.unwrap_or(true),
            tags: self.tags.unwrap_or_default(),
            published: self.published,
        }
    }
}

/// A post with its rendered HTML attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPost {
    #[serde(flatten)]
    pub post: Post,
    pub content_html: String,
    pub content_html_preview: String,
}

impl RenderedPost {
    pub fn new(post: Post, rendered: Rendered) -> Self {
        Self {
            post,
            content_html: rendered.html,
            content_html_preview: rendered.html_preview,
        }
    }
}

/// A bookmarked link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub title: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /likes`. Exactly `title` and `url`, nothing else.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikePayload {
    pub title: String,
    pub url: String,
}

/// Asset content hashes published alongside the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashList {
    pub hashes: BTreeMap<String, String>,
}

/// Body of `POST /content`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Response carrying the id of a newly created document.
#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeList {
    pub likes: Vec<Like>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostList {
    pub posts: Vec<RenderedPost>,
}

/// Semantic checks that run after a body deserializes. Bodies whose shape is
/// the whole contract keep the default.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for LikePayload {
    fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.url.is_empty() {
            return Err("url must not be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for PostPayload {}

impl Validate for ContentRequest {}

impl Validate for HashList {}
