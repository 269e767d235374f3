//! Post handlers: the public feed, single posts and the publish transition.

use actix_web::{HttpResponse, web};

use quill_core::domain::PostPatch;
use quill_core::pagination::Cursor;
use quill_shared::dto::{CreatePostRequest, ListParams, PublishPostRequest, UpdatePostRequest};

use super::parse_id;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts?author=&size=&cursor=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let ListParams {
        size,
        cursor,
        author,
    } = query.into_inner();

    let page = state
        .posts
        .list_published(author, size, cursor.map(Cursor::new))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let CreatePostRequest { title, content } = body.into_inner();
    let post = state
        .posts
        .create_draft(identity.session(), title, content)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

/// GET /api/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state.posts.get_post(viewer.session(), id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PATCH /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let UpdatePostRequest { title, content } = body.into_inner();

    let post = state
        .posts
        .update_post(identity.session(), id, PostPatch { title, content })
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id} - responds with the deleted post.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state.posts.delete_post(identity.session(), id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// PATCH /api/posts/publish/{id}
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<PublishPostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let PublishPostRequest { title, content } = body.into_inner();

    let post = state
        .posts
        .publish(identity.session(), id, title, content)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// GET /api/posts/slug/{slug}
pub async fn by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get_published(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}
