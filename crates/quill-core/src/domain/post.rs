use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug;
use crate::error::DomainError;

/// Current time at the precision every backend can store (microseconds).
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Author snapshot captured when the post is created. Never re-resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// Where a post sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

/// Post entity - a blog post, drafted or published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub slug: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fields required to create a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: Author,
}

/// Partial update of the user-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostPatch {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// A validated request to publish a post.
///
/// The slug is a candidate: it is only used when the post has never been
/// published before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub at: DateTime<Utc>,
}

impl Publication {
    /// Validate the title and derive a fresh candidate slug from it.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation(
                "A post needs a title before it can be published".to_string(),
            ));
        }

        Ok(Self {
            slug: slug::generate(&title),
            title,
            content: content.into(),
            at: timestamp(),
        })
    }
}

/// What a publish call did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Draft → Published: slug and `published_at` were assigned.
    FirstPublish,
    /// Already published: only title, content and `updated_at` changed.
    Republished,
}

impl Post {
    /// Create a new draft with generated ID and timestamps.
    pub fn new(new: NewPost) -> Self {
        let now = timestamp();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            content: new.content,
            author: new.author,
            slug: None,
            published: false,
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    pub fn status(&self) -> PostStatus {
        if self.published {
            PostStatus::Published
        } else {
            PostStatus::Draft
        }
    }

    /// Timestamp the feed orders this post by.
    pub fn sort_key(&self) -> DateTime<Utc> {
        match self.published_at {
            Some(at) if self.published => at,
            _ => self.updated_at,
        }
    }

    /// Merge a patch. Never touches slug, `published` or `published_at`.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.touch(timestamp());
    }

    /// Move `updated_at` forward to `at`, and always past its previous value.
    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at.max(self.updated_at + TimeDelta::microseconds(1));
    }

    /// Apply the publish transition in place.
    pub fn publish(&mut self, publication: Publication) -> PublishOutcome {
        let Publication {
            title,
            content,
            slug,
            at,
        } = publication;

        self.title = title;
        self.content = content;
        self.touch(at);

        if self.slug.is_some() {
            return PublishOutcome::Republished;
        }

        self.slug = Some(slug);
        self.published = true;
        self.published_at = Some(self.updated_at);
        PublishOutcome::FirstPublish
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Author {
        Author {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image: None,
        }
    }

    fn draft(title: &str) -> Post {
        Post::new(NewPost {
            title: title.to_string(),
            content: "body".to_string(),
            author: author(),
        })
    }

    #[test]
    fn test_new_post_is_unpublished_draft() {
        let post = draft("Hello");
        assert_eq!(post.status(), PostStatus::Draft);
        assert!(post.slug.is_none());
        assert!(post.published_at.is_none());
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(matches!(
            Publication::new("", "content"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Publication::new("   ", "content"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_first_publish_assigns_slug_and_timestamp() {
        let mut post = draft("Hello World");
        let publication = Publication::new("Hello World", "body").unwrap();
        let at = publication.at;

        assert_eq!(post.publish(publication), PublishOutcome::FirstPublish);
        assert!(post.published);
        assert!(post.slug.as_deref().unwrap().starts_with("hello-world-"));
        assert!(post.updated_at >= at);
        assert_eq!(post.published_at, Some(post.updated_at));
    }

    #[test]
    fn test_republish_keeps_slug_and_published_at() {
        let mut post = draft("Hello World");
        post.publish(Publication::new("Hello World", "body").unwrap());
        let slug = post.slug.clone();
        let published_at = post.published_at;

        let mut second = Publication::new("Renamed", "new body").unwrap();
        second.at = published_at.unwrap() + chrono::TimeDelta::seconds(5);

        assert_eq!(post.publish(second), PublishOutcome::Republished);
        assert_eq!(post.slug, slug);
        assert_eq!(post.published_at, published_at);
        assert_eq!(post.title, "Renamed");
        assert!(post.updated_at > published_at.unwrap());
    }

    #[test]
    fn test_slug_iff_published_across_lifecycle() {
        let mut post = draft("");
        let holds = |p: &Post| {
            p.slug.is_some() == p.published && p.slug.is_some() == p.published_at.is_some()
        };
        assert!(holds(&post));

        post.apply(PostPatch::new("Title", "typing"));
        assert!(holds(&post));

        post.publish(Publication::new("Title", "typing").unwrap());
        assert!(holds(&post));

        post.apply(PostPatch::new("Edited after publish", "more"));
        assert!(holds(&post));
        assert!(post.published);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut post = draft("Keep");
        post.apply(PostPatch {
            title: None,
            content: Some("changed".to_string()),
        });
        assert_eq!(post.title, "Keep");
        assert_eq!(post.content, "changed");
    }

    #[test]
    fn test_republish_at_same_instant_still_advances_updated_at() {
        let mut post = draft("Hello");
        let first = Publication::new("Hello", "body").unwrap();
        let mut second = Publication::new("Hello again", "body").unwrap();
        second.at = first.at;

        post.publish(first);
        let before = post.updated_at;
        post.publish(second);

        assert!(post.updated_at > before);
        assert!(post.updated_at > post.published_at.unwrap());
    }

    #[test]
    fn test_sort_key_follows_status() {
        let mut post = draft("Ordering");
        assert_eq!(post.sort_key(), post.updated_at);

        post.publish(Publication::new("Ordering", "").unwrap());
        post.apply(PostPatch::new("Ordering", "later edit"));
        assert_eq!(Some(post.sort_key()), post.published_at);
    }
}
