//! Document storage.
//!
//! Handlers talk to a [`DocumentStore`]; the managed document database used in
//! production sits behind the same trait. [`MemoryStore`] keeps everything in
//! process and is what the binary runs with by default.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::models::{HashList, Like, LikePayload, Post, PostPayload};

/// Storage for likes, posts and the asset hash list.
///
/// Listing methods return documents newest first. Deleting an id that does
/// not exist succeeds.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_likes(&self) -> anyhow::Result<Vec<Like>>;

    /// Store a like stamped with the current time and return its id.
    async fn insert_like(&self, like: LikePayload) -> anyhow::Result<String>;

    async fn delete_like(&self, id: &str) -> anyhow::Result<()>;

    /// All posts ordered by `published`, newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;

    async fn get_post(&self, id: &str) -> anyhow::Result<Option<Post>>;

    async fn insert_post(&self, post: PostPayload) -> anyhow::Result<String>;

    /// Replace (or create) the post stored under `id`.
    async fn put_post(&self, id: &str, post: PostPayload) -> anyhow::Result<()>;

    async fn delete_post(&self, id: &str) -> anyhow::Result<()>;

    async fn get_hashes(&self) -> anyhow::Result<HashList>;

    async fn put_hashes(&self, hashes: HashList) -> anyhow::Result<HashList>;
}

#[derive(Debug, Default)]
struct Collections {
    likes: HashMap<String, Like>,
    posts: HashMap<String, Post>,
    hashes: HashList,
}

/// In-process [`DocumentStore`] backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_likes(&self) -> anyhow::Result<Vec<Like>> {
        let mut likes: Vec<Like> = self.inner.read().likes.values().cloned().collect();
        likes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(likes)
    }

    async fn insert_like(&self, like: LikePayload) -> anyhow::Result<String> {
        let id = new_id();
        let like = Like {
            id: id.clone(),
            title: like.title,
            url: like.url,
            timestamp: Utc::now(),
        };
        self.inner.write().likes.insert(id.clone(), like);
        tracing::debug!(id = %id, "like stored");
        Ok(id)
    }

    async fn delete_like(&self, id: &str) -> anyhow::Result<()> {
        self.inner.write().likes.remove(id);
        Ok(())
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.inner.read().posts.values().cloned().collect();
        posts.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn get_post(&self, id: &str) -> anyhow::Result<Option<Post>> {
        Ok(self.inner.read().posts.get(id).cloned())
    }

    async fn insert_post(&self, post: PostPayload) -> anyhow::Result<String> {
        let id = new_id();
        let post = post.into_post(id.clone());
        self.inner.write().posts.insert(id.clone(), post);
        tracing::debug!(id = %id, "post stored");
        Ok(id)
    }

    async fn put_post(&self, id: &str, post: PostPayload) -> anyhow::Result<()> {
        let post = post.into_post(id.to_string());
        self.inner.write().posts.insert(id.to_string(), post);
        Ok(())
    }

    async fn delete_post(&self, id: &str) -> anyhow::Result<()> {
        self.inner.write().posts.remove(id);
        Ok(())
    }

    async fn get_hashes(&self) -> anyhow::Result<HashList> {
        Ok(self.inner.read().hashes.clone())
    }

    async fn put_hashes(&self, hashes: HashList) -> anyhow::Result<HashList> {
        self.inner.write().hashes = hashes.clone();
        Ok(hashes)
    }
}
