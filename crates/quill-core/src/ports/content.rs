//! Ports used by the editing and reading clients.
//!
//! Both are implemented on the server by [`crate::service`] and remotely by
//! the HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;
use crate::pagination::{Cursor, DEFAULT_PAGE_SIZE, Page};

/// Persistence target of the autosave controller.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Create the record on the first save of a new draft.
    async fn create_draft(&self, title: &str, content: &str) -> Result<Post, DomainError>;

    /// Overwrite title and content of an existing post.
    async fn save_draft(&self, id: Uuid, title: &str, content: &str) -> Result<Post, DomainError>;
}

/// Which listing a feed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedScope {
    /// Published posts, newest first.
    Published,
    /// Unpublished posts, most recently updated first.
    Drafts,
}

/// Query key identifying one filtered, sorted view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub scope: FeedScope,
    pub author: Option<String>,
    pub page_size: u32,
}

impl FeedQuery {
    pub fn published() -> Self {
        Self {
            scope: FeedScope::Published,
            author: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn drafts_by(author: impl Into<String>) -> Self {
        Self {
            scope: FeedScope::Drafts,
            author: Some(author.into()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn by_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Source of feed pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Post>, DomainError>;
}
