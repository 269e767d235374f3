//! Slug enumeration for static pre-rendering.

use actix_web::{HttpResponse, web};

use quill_core::pagination::Cursor;
use quill_shared::dto::ListParams;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/slugs?size=&cursor=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let ListParams { size, cursor, .. } = query.into_inner();
    let page = state.posts.list_slugs(size, cursor.map(Cursor::new)).await?;
    Ok(HttpResponse::Ok().json(page))
}
