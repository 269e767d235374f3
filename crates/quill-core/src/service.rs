//! Post use cases: ownership checks, the publish transition and listings.
//!
//! The caller's session is always passed in explicitly.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Post, PostPatch, Publication, Session};
use crate::error::{DomainError, RepoError};
use crate::pagination::{self, Cursor, MAX_PAGE_SIZE, Page};
use crate::ports::{DraftStore, FeedQuery, FeedScope, ListQuery, PageSource, PostRepository};

/// Application service over the content repository.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Create a new draft owned by the session user.
    pub async fn create_draft(
        &self,
        session: &Session,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Post, DomainError> {
        let post = self
            .repo
            .create_post(NewPost {
                title: title.into(),
                content: content.into(),
                author: session.author(),
            })
            .await?;

        tracing::info!(post_id = %post.id, author = %session.email, "Draft created");
        Ok(post)
    }

    /// Read a post by id. Drafts are only visible to their author.
    pub async fn get_post(&self, viewer: Option<&Session>, id: Uuid) -> Result<Post, DomainError> {
        let post = self.find(id).await?;
        if !post.published {
            authorize(viewer, &post)?;
        }
        Ok(post)
    }

    /// Read a published post by its slug.
    pub async fn get_published(&self, slug: &str) -> Result<Post, DomainError> {
        self.repo.get_post_by_slug(slug).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(slug),
            other => other.into(),
        })
    }

    /// Update title and/or content. Slug and publication state never change here.
    pub async fn update_post(
        &self,
        session: &Session,
        id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation(
                "Nothing to update: provide a title or content".to_string(),
            ));
        }

        let post = self.find(id).await?;
        authorize(Some(session), &post)?;

        let updated = self.repo.update_post(id, patch).await.map_err(|e| not_found(e, id))?;
        tracing::debug!(post_id = %id, "Post updated");
        Ok(updated)
    }

    /// Delete a post permanently, returning the removed record.
    pub async fn delete_post(&self, session: &Session, id: Uuid) -> Result<Post, DomainError> {
        let post = self.find(id).await?;
        authorize(Some(session), &post)?;

        self.repo.delete_post(id).await.map_err(|e| not_found(e, id))?;
        tracing::info!(post_id = %id, author = %session.email, "Post deleted");
        Ok(post)
    }

    /// Publish a post, assigning its slug on the first publish.
    ///
    /// A blank title is rejected before the repository is contacted.
    pub async fn publish(
        &self,
        session: &Session,
        id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Post, DomainError> {
        let publication = Publication::new(title, content)?;

        let post = self.find(id).await?;
        authorize(Some(session), &post)?;

        let published = self
            .repo
            .publish_post(id, publication)
            .await
            .map_err(|e| not_found(e, id))?;

        if post.slug.is_none() {
            tracing::info!(
                post_id = %id,
                slug = published.slug.as_deref().unwrap_or_default(),
                "Post published"
            );
        } else {
            tracing::debug!(post_id = %id, "Published post updated");
        }

        Ok(published)
    }

    /// Public feed of published posts, optionally for one author.
    pub async fn list_published(
        &self,
        author: Option<String>,
        page_size: Option<u32>,
        cursor: Option<Cursor>,
    ) -> Result<Page<Post>, DomainError> {
        let query = ListQuery {
            author,
            published: true,
            page_size: pagination::page_size(page_size)?,
            cursor,
        };
        Ok(self.repo.list_posts(query).await?)
    }

    /// Drafts of the session user.
    pub async fn list_drafts(
        &self,
        session: &Session,
        page_size: Option<u32>,
        cursor: Option<Cursor>,
    ) -> Result<Page<Post>, DomainError> {
        let query = ListQuery {
            author: Some(session.email.clone()),
            published: false,
            page_size: pagination::page_size(page_size)?,
            cursor,
        };
        Ok(self.repo.list_posts(query).await?)
    }

    /// One page of published slugs.
    pub async fn list_slugs(
        &self,
        page_size: Option<u32>,
        cursor: Option<Cursor>,
    ) -> Result<Page<String>, DomainError> {
        let size = pagination::page_size(page_size)?;
        Ok(self.repo.list_all_slugs(cursor, size).await?)
    }

    /// Every published slug, walking the cursor until it runs out.
    pub async fn all_slugs(&self) -> Result<Vec<String>, DomainError> {
        let mut slugs = Vec::new();
        let mut cursor = None;

        loop {
            let page = self.repo.list_all_slugs(cursor, MAX_PAGE_SIZE).await?;
            slugs.extend(page.data);
            match page.after {
                Some(next) => cursor = Some(next),
                None => return Ok(slugs),
            }
        }
    }

    /// Bind this service to a session, for the autosave controller.
    pub fn drafts_for(&self, session: Session) -> SessionDrafts {
        SessionDrafts {
            service: self.clone(),
            session,
        }
    }

    async fn find(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo.get_post(id).await.map_err(|e| not_found(e, id))
    }
}

fn authorize(viewer: Option<&Session>, post: &Post) -> Result<(), DomainError> {
    match viewer {
        None => Err(DomainError::Unauthorized),
        Some(session) if session.owns(post) => Ok(()),
        Some(_) => Err(DomainError::Forbidden(
            "Only the author can access this post".to_string(),
        )),
    }
}

fn not_found(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::post_not_found(id),
        other => other.into(),
    }
}

#[async_trait]
impl PageSource for PostService {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Post>, DomainError> {
        let published = match query.scope {
            FeedScope::Published => true,
            FeedScope::Drafts if query.author.is_some() => false,
            FeedScope::Drafts => {
                return Err(DomainError::Validation(
                    "A drafts feed needs an author".to_string(),
                ));
            }
        };

        let list = ListQuery {
            author: query.author.clone(),
            published,
            page_size: pagination::page_size(Some(query.page_size))?,
            cursor: cursor.cloned(),
        };
        Ok(self.repo.list_posts(list).await?)
    }
}

/// [`PostService`] bound to one signed-in user.
#[derive(Clone)]
pub struct SessionDrafts {
    service: PostService,
    session: Session,
}

#[async_trait]
impl DraftStore for SessionDrafts {
    async fn create_draft(&self, title: &str, content: &str) -> Result<Post, DomainError> {
        self.service.create_draft(&self.session, title, content).await
    }

    async fn save_draft(&self, id: Uuid, title: &str, content: &str) -> Result<Post, DomainError> {
        self.service
            .update_post(&self.session, id, PostPatch::new(title, content))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Minimal map-backed repository that counts every call.
    #[derive(Default)]
    struct CountingRepo {
        posts: Mutex<HashMap<Uuid, Post>>,
        calls: AtomicUsize,
    }

    impl CountingRepo {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn with_post<R>(&self, id: Uuid, f: impl FnOnce(&mut Post) -> R) -> Result<R, RepoError> {
            let mut posts = self.posts.lock().unwrap();
            posts.get_mut(&id).map(f).ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl PostRepository for CountingRepo {
        async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
            self.touch();
            let post = Post::new(new);
            self.posts.lock().unwrap().insert(post.id, post.clone());
            Ok(post)
        }

        async fn get_post(&self, id: Uuid) -> Result<Post, RepoError> {
            self.touch();
            self.with_post(id, |p| p.clone())
        }

        async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
            self.touch();
            let posts = self.posts.lock().unwrap();
            posts
                .values()
                .find(|p| p.slug.as_deref() == Some(slug))
                .cloned()
                .ok_or(RepoError::NotFound)
        }

        async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
            self.touch();
            self.with_post(id, |p| {
                p.apply(patch);
                p.clone()
            })
        }

        async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
            self.touch();
            self.posts
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepoError::NotFound)
        }

        async fn publish_post(&self, id: Uuid, publication: Publication) -> Result<Post, RepoError> {
            self.touch();
            self.with_post(id, |p| {
                p.publish(publication);
                p.clone()
            })
        }

        async fn list_posts(&self, query: ListQuery) -> Result<Page<Post>, RepoError> {
            self.touch();
            let posts = self.posts.lock().unwrap();
            let data = posts
                .values()
                .filter(|p| p.published == query.published)
                .filter(|p| query.author.as_ref().is_none_or(|a| *a == p.author.email))
                .cloned()
                .collect();
            Ok(Page::last(data))
        }

        async fn list_all_slugs(
            &self,
            cursor: Option<Cursor>,
            _page_size: u32,
        ) -> Result<Page<String>, RepoError> {
            self.touch();
            // Two fixed pages to exercise the cursor walk.
            Ok(match cursor {
                None => Page::new(vec!["a".into(), "b".into()], Some(Cursor::new("b"))),
                Some(_) => Page::last(vec!["c".into()]),
            })
        }
    }

    fn session(email: &str) -> Session {
        Session {
            name: "Test".to_string(),
            email: email.to_string(),
            image: None,
        }
    }

    fn service() -> (PostService, Arc<CountingRepo>) {
        let repo = Arc::new(CountingRepo::default());
        (PostService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_blank_title_publish_never_reaches_repository() {
        let (service, repo) = service();

        let result = service
            .publish(&session("a@example.com"), Uuid::new_v4(), "", "content")
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_publish_then_lookup_by_slug() {
        let (service, _) = service();
        let owner = session("a@example.com");

        let draft = service.create_draft(&owner, "Hello", "body").await.unwrap();
        let published = service
            .publish(&owner, draft.id, "Hello World", "body")
            .await
            .unwrap();

        let slug = published.slug.clone().unwrap();
        let by_slug = service.get_published(&slug).await.unwrap();
        assert_eq!(by_slug.id, draft.id);
        assert_eq!(service.get_post(None, draft.id).await.unwrap().id, draft.id);
    }

    #[tokio::test]
    async fn test_republish_keeps_slug() {
        let (service, _) = service();
        let owner = session("a@example.com");

        let draft = service.create_draft(&owner, "First", "").await.unwrap();
        let first = service.publish(&owner, draft.id, "First", "").await.unwrap();
        let second = service
            .publish(&owner, draft.id, "Second title", "edited")
            .await
            .unwrap();

        assert_eq!(second.slug, first.slug);
        assert_eq!(second.published_at, first.published_at);
        assert_eq!(second.title, "Second title");
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_only_owner_mutates() {
        let (service, _) = service();
        let owner = session("owner@example.com");
        let intruder = session("intruder@example.com");

        let draft = service.create_draft(&owner, "Mine", "").await.unwrap();

        let update = service
            .update_post(&intruder, draft.id, PostPatch::new("Theirs", ""))
            .await;
        assert!(matches!(update, Err(DomainError::Forbidden(_))));

        let delete = service.delete_post(&intruder, draft.id).await;
        assert!(matches!(delete, Err(DomainError::Forbidden(_))));

        let publish = service.publish(&intruder, draft.id, "Theirs", "").await;
        assert!(matches!(publish, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_draft_hidden_from_anonymous_readers() {
        let (service, _) = service();
        let owner = session("owner@example.com");
        let draft = service.create_draft(&owner, "Secret", "").await.unwrap();

        assert!(matches!(
            service.get_post(None, draft.id).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(service.get_post(Some(&owner), draft.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, _) = service();
        let owner = session("owner@example.com");
        let draft = service.create_draft(&owner, "Gone", "").await.unwrap();

        service.delete_post(&owner, draft.id).await.unwrap();

        assert!(matches!(
            service.get_post(Some(&owner), draft.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let (service, repo) = service();
        let result = service
            .update_post(&session("a@example.com"), Uuid::new_v4(), PostPatch::default())
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_slugs_follows_cursor() {
        let (service, _) = service();
        assert_eq!(service.all_slugs().await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_drafts_feed_requires_author() {
        let (service, _) = service();
        let query = FeedQuery {
            scope: FeedScope::Drafts,
            author: None,
            page_size: 10,
        };
        assert!(matches!(
            service.fetch_page(&query, None).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_session_drafts_create_then_save() {
        let (service, _) = service();
        let owner = session("owner@example.com");
        let drafts = service.drafts_for(owner.clone());

        let created = drafts.create_draft("Hello", "").await.unwrap();
        let saved = drafts.save_draft(created.id, "Hello World", "x").await.unwrap();

        assert_eq!(saved.id, created.id);
        assert_eq!(saved.title, "Hello World");
        assert!(owner.owns(&saved));
    }
}
