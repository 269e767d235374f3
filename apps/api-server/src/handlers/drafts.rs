//! Drafts of the signed-in author.

use actix_web::{HttpResponse, web};

use quill_core::pagination::Cursor;
use quill_shared::dto::ListParams;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/drafts?size=&cursor=
///
/// An `author` parameter is accepted only when it names the session user.
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListParams>,
) -> AppResult<HttpResponse> {
    let ListParams {
        size,
        cursor,
        author,
    } = query.into_inner();
    let session = identity.session();

    if author.is_some_and(|author| author != session.email) {
        return Err(AppError::Forbidden(
            "Drafts are only visible to their author".to_string(),
        ));
    }

    let page = state
        .posts
        .list_drafts(session, size, cursor.map(Cursor::new))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}
