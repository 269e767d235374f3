use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Post, PostPatch, Publication};
use crate::error::RepoError;
use crate::pagination::{Cursor, Page};

/// Filter and position for a post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Only posts whose author has this email.
    pub author: Option<String>,
    /// Published feed when true, drafts when false.
    pub published: bool,
    pub page_size: u32,
    pub cursor: Option<Cursor>,
}

/// Content repository - the document store holding post records.
///
/// Every call is atomic on its own. Published listings are ordered by
/// `published_at` descending, drafts by `updated_at` descending, ties broken
/// by id descending.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new unpublished post.
    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError>;

    async fn get_post(&self, id: Uuid) -> Result<Post, RepoError>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RepoError>;

    /// Merge the patch and refresh `updated_at`.
    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError>;

    /// Remove the record permanently.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    /// Apply the publish transition (see [`Post::publish`]) atomically.
    async fn publish_post(&self, id: Uuid, publication: Publication) -> Result<Post, RepoError>;

    async fn list_posts(&self, query: ListQuery) -> Result<Page<Post>, RepoError>;

    /// Slugs of every published post, ascending.
    async fn list_all_slugs(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Page<String>, RepoError>;
}
