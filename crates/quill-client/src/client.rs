//! Typed HTTP client for the Quill API.
//!
//! [`QuillClient`] is also the remote [`DraftStore`] for the autosave
//! controller and the remote [`PageSource`] for the feed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::domain::Post;
use quill_core::pagination::{Cursor, MAX_PAGE_SIZE, Page};
use quill_core::ports::{DraftStore, FeedQuery, FeedScope, PageSource};
use quill_shared::ErrorResponse;
use quill_shared::dto::{CreatePostRequest, ListParams, PublishPostRequest, UpdatePostRequest};

use crate::error::ClientError;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Session token from the identity provider. Reads of public data work
    /// without one.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// HTTP client for the Quill API.
#[derive(Debug, Clone)]
pub struct QuillClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl QuillClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| ClientError::BaseUrl(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token,
        })
    }

    /// Published posts, newest first.
    pub async fn list_posts(&self, params: &ListParams) -> Result<Page<Post>, ClientError> {
        self.send(self.request(Method::GET, "/api/posts").query(params))
            .await
    }

    /// Drafts of the signed-in user, most recently edited first.
    pub async fn list_drafts(&self, params: &ListParams) -> Result<Page<Post>, ClientError> {
        self.send(self.request(Method::GET, "/api/drafts").query(params))
            .await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/posts/{id}")))
            .await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Post, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/posts/slug/{slug}")))
            .await
    }

    pub async fn create_post(&self, body: &CreatePostRequest) -> Result<Post, ClientError> {
        self.send(self.request(Method::POST, "/api/posts").json(body))
            .await
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        body: &UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/api/posts/{id}")).json(body))
            .await
    }

    pub async fn publish(&self, id: Uuid, body: &PublishPostRequest) -> Result<Post, ClientError> {
        self.send(
            self.request(Method::PATCH, &format!("/api/posts/publish/{id}"))
                .json(body),
        )
        .await
    }

    /// Delete a post, returning what was removed.
    pub async fn delete_post(&self, id: Uuid) -> Result<Post, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/posts/{id}")))
            .await
    }

    /// One page of published slugs, ascending.
    pub async fn list_slugs(
        &self,
        cursor: Option<&Cursor>,
        size: Option<u32>,
    ) -> Result<Page<String>, ClientError> {
        let params = ListParams {
            size,
            cursor: cursor.map(|c| c.as_str().to_string()),
            author: None,
        };
        self.send(self.request(Method::GET, "/api/slugs").query(&params))
            .await
    }

    /// Every published slug, for pre-rendering one page per post.
    pub async fn collect_slugs(&self) -> Result<Vec<String>, ClientError> {
        let mut slugs = Vec::new();
        let mut cursor: Option<Cursor> = None;

        loop {
            let page = self.list_slugs(cursor.as_ref(), Some(MAX_PAGE_SIZE)).await?;
            slugs.extend(page.data);
            match page.after {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = slugs.len(), "Collected published slugs");
        Ok(slugs)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await?;
        let status = res.status();

        if status.is_success() {
            return Ok(res.json().await?);
        }

        let body = res.json::<ErrorResponse>().await.ok();
        tracing::debug!(
            status = status.as_u16(),
            message = body.as_ref().map(|b| b.message.as_str()),
            "API request failed"
        );
        Err(ClientError::from_status(status.as_u16(), body))
    }
}

#[async_trait]
impl DraftStore for QuillClient {
    async fn create_draft(&self, title: &str, content: &str) -> Result<Post, DomainError> {
        let body = CreatePostRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        Ok(self.create_post(&body).await?)
    }

    async fn save_draft(&self, id: Uuid, title: &str, content: &str) -> Result<Post, DomainError> {
        let body = UpdatePostRequest {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        };
        Ok(self.update_post(id, &body).await?)
    }
}

#[async_trait]
impl PageSource for QuillClient {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Post>, DomainError> {
        let params = ListParams {
            size: Some(query.page_size),
            cursor: cursor.map(|c| c.as_str().to_string()),
            author: query.author.clone(),
        };

        let page = match query.scope {
            FeedScope::Published => self.list_posts(&params).await?,
            FeedScope::Drafts => self.list_drafts(&params).await?,
        };
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};

    use quill_core::autosave::{AutosaveConfig, AutosaveController, SaveStatus};
    use quill_core::domain::{Author, NewPost};
    use quill_core::feed::{FeedClient, LoadOutcome};

    use super::*;

    fn post(title: &str) -> Post {
        Post::new(NewPost {
            title: title.to_string(),
            content: String::new(),
            author: Author {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                image: None,
            },
        })
    }

    /// Start a real server on an ephemeral port and return its base URL.
    async fn serve<F>(configure: F) -> String
    where
        F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
    {
        let server = HttpServer::new(move || App::new().configure(configure.clone()))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        actix_rt::spawn(server.run());
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> QuillClient {
        QuillClient::new(ClientConfig::new(base_url).with_token("test-token")).unwrap()
    }

    async fn two_page_feed(query: web::Query<ListParams>, hits: web::Data<AtomicUsize>) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        match query.cursor.as_deref() {
            None => {
                let data = (1..=10).map(|n| post(&format!("p{n}"))).collect();
                HttpResponse::Ok().json(Page::new(data, Some(Cursor::new("C1"))))
            }
            Some("C1") => {
                let data = (11..=18).map(|n| post(&format!("p{n}"))).collect();
                HttpResponse::Ok().json(Page::<Post>::last(data))
            }
            Some(_) => HttpResponse::BadRequest().json(ErrorResponse::bad_request("Invalid cursor")),
        }
    }

    #[actix_rt::test]
    async fn test_feed_over_http_reads_every_page_once() {
        let hits = web::Data::new(AtomicUsize::new(0));
        let base = serve({
            let hits = hits.clone();
            move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(hits.clone())
                    .route("/api/posts", web::get().to(two_page_feed));
            }
        })
        .await;

        let feed = FeedClient::new(Arc::new(client(&base)), FeedQuery::published());
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Loaded { added: 10 });
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Loaded { added: 8 });
        assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Exhausted);

        let titles: Vec<String> = feed.items().into_iter().map(|p| p.title).collect();
        let expected: Vec<String> = (1..=18).map(|n| format!("p{n}")).collect();
        assert_eq!(titles, expected);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    async fn slugs(query: web::Query<ListParams>) -> HttpResponse {
        let all = ["alpha-1", "bravo-2", "charlie-3", "delta-4", "echo-5"];
        let start = match query.cursor.as_deref() {
            None => 0,
            Some(after) => all.iter().position(|s| *s == after).map_or(all.len(), |i| i + 1),
        };
        // Two per page regardless of the requested size.
        let data: Vec<String> = all[start..].iter().take(2).map(|s| s.to_string()).collect();
        let after = (start + 2 < all.len()).then(|| Cursor::new(data[data.len() - 1].clone()));
        HttpResponse::Ok().json(Page::new(data, after))
    }

    #[actix_rt::test]
    async fn test_collect_slugs_follows_cursor() {
        let base = serve(|cfg: &mut web::ServiceConfig| {
            cfg.route("/api/slugs", web::get().to(slugs));
        })
        .await;

        let all = client(&base).collect_slugs().await.unwrap();
        assert_eq!(all, vec!["alpha-1", "bravo-2", "charlie-3", "delta-4", "echo-5"]);
    }

    type Saved = web::Data<Mutex<HashMap<Uuid, Post>>>;

    async fn create(req: HttpRequest, body: web::Json<CreatePostRequest>, store: Saved) -> HttpResponse {
        if req.headers().get("authorization").and_then(|v| v.to_str().ok())
            != Some("Bearer test-token")
        {
            return HttpResponse::Unauthorized().json(ErrorResponse::unauthorized("You must be signed in."));
        }
        let mut created = post(&body.title);
        created.content = body.content.clone();
        store.lock().unwrap().insert(created.id, created.clone());
        HttpResponse::Created().json(created)
    }

    async fn update(
        path: web::Path<Uuid>,
        body: web::Json<UpdatePostRequest>,
        store: Saved,
    ) -> HttpResponse {
        let mut posts = store.lock().unwrap();
        let Some(post) = posts.get_mut(&path) else {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("No post found"));
        };
        if let Some(title) = &body.title {
            post.title = title.clone();
        }
        if let Some(content) = &body.content {
            post.content = content.clone();
        }
        HttpResponse::Ok().json(post.clone())
    }

    #[actix_rt::test]
    async fn test_autosave_through_client_creates_then_updates() {
        let store: Saved = web::Data::new(Mutex::new(HashMap::new()));
        let base = serve({
            let store = store.clone();
            move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(store.clone())
                    .route("/api/posts", web::post().to(create))
                    .route("/api/posts/{id}", web::patch().to(update));
            }
        })
        .await;

        let config = AutosaveConfig {
            delay: Duration::from_millis(20),
        };
        let autosave = AutosaveController::spawn(Arc::new(client(&base)), None, config);

        autosave.edit("Hello", "");
        let mut status = autosave.status_changes();
        while *status.borrow_and_update() != SaveStatus::Saved {
            status.changed().await.unwrap();
        }
        let id = autosave.post_id().unwrap();

        autosave.edit("Hello World", "more");
        for _ in 0..200 {
            if store.lock().unwrap()[&id].content == "more" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        autosave.close().await;

        let posts = store.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[&id].title, "Hello World");
        assert_eq!(posts[&id].content, "more");
    }

    #[actix_rt::test]
    async fn test_error_body_becomes_domain_error() {
        let base = serve(|cfg: &mut web::ServiceConfig| {
            cfg.route(
                "/api/posts/{id}",
                web::get().to(|| async {
                    HttpResponse::Forbidden()
                        .json(ErrorResponse::forbidden("Only the author can access this post"))
                }),
            );
        })
        .await;

        let err = client(&base).get_post(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));

        match DomainError::from(err) {
            DomainError::Forbidden(message) => {
                assert_eq!(message, "Only the author can access this post")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_rt::test]
    async fn test_missing_token_is_unauthorized() {
        let store: Saved = web::Data::new(Mutex::new(HashMap::new()));
        let base = serve({
            let store = store.clone();
            move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(store.clone())
                    .route("/api/posts", web::post().to(create));
            }
        })
        .await;

        let anonymous = QuillClient::new(ClientConfig::new(base.as_str())).unwrap();
        let err = anonymous.create_draft("Sneaky", "").await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized));
        assert!(store.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = QuillClient::new(ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::BaseUrl(_)));
    }
}
