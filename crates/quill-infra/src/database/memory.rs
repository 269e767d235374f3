//! In-memory post repository - used when no database is configured and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{NewPost, Post, PostPatch, Publication, PublishOutcome};
use quill_core::pagination::{Cursor, Page, paginate};
use quill_core::ports::{ListQuery, PostRepository};

use crate::cursor::Keyset;

/// Post store backed by a `HashMap` behind an async RwLock.
///
/// Each operation holds the lock for its whole duration, so every call is
/// atomic. Data is lost on process restart.
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
        }
    }

    fn keyset(post: &Post) -> Keyset {
        Keyset::new(post.sort_key(), post.id)
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
        let post = Post::new(new);
        let mut posts = self.posts.write().await;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, RepoError> {
        let posts = self.posts.read().await;
        posts.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
        let posts = self.posts.read().await;
        posts
            .values()
            .find(|post| post.published && post.slug.as_deref() == Some(slug))
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply(patch);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn publish_post(&self, id: Uuid, publication: Publication) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;

        let first_publish = posts.get(&id).ok_or(RepoError::NotFound)?.slug.is_none();
        if first_publish
            && posts
                .values()
                .any(|other| other.slug.as_deref() == Some(publication.slug.as_str()))
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is already taken",
                publication.slug
            )));
        }

        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        if post.publish(publication) == PublishOutcome::FirstPublish {
            tracing::debug!(post_id = %id, slug = ?post.slug, "Slug assigned");
        }
        Ok(post.clone())
    }

    async fn list_posts(&self, query: ListQuery) -> Result<Page<Post>, RepoError> {
        let after = query.cursor.as_ref().map(Keyset::decode).transpose()?;
        let posts = self.posts.read().await;

        let mut matching: Vec<&Post> = posts
            .values()
            .filter(|post| post.published == query.published)
            .filter(|post| {
                query
                    .author
                    .as_deref()
                    .is_none_or(|email| post.author.email == email)
            })
            .filter(|post| after.is_none_or(|after| Self::keyset(post) < after))
            .collect();
        matching.sort_by_key(|post| std::cmp::Reverse(Self::keyset(post)));

        let limit = query.page_size as usize;
        let items = matching.into_iter().take(limit + 1).cloned().collect();
        Ok(paginate(items, limit, |post: &Post| Self::keyset(post).encode()))
    }

    async fn list_all_slugs(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Page<String>, RepoError> {
        let posts = self.posts.read().await;

        let mut slugs: Vec<String> = posts
            .values()
            .filter(|post| post.published)
            .filter_map(|post| post.slug.clone())
            .filter(|slug| cursor.as_ref().is_none_or(|after| slug.as_str() > after.as_str()))
            .collect();
        slugs.sort();

        let limit = page_size as usize;
        slugs.truncate(limit + 1);
        Ok(paginate(slugs, limit, |slug: &String| Cursor::new(slug.clone())))
    }
}
