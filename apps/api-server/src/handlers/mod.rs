//! HTTP handlers and route configuration.

mod drafts;
mod health;
mod posts;
mod slugs;


use actix_web::error::InternalError;
use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use quill_shared::ErrorResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        let body = bad_request(req, err.to_string());
        InternalError::from_response(err, body).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        let body = bad_request(req, err.to_string());
        InternalError::from_response(err, body).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list))
                    .route(web::post().to(posts::create))
                    .default_service(web::to(method_not_supported)),
            )
            .service(
                web::resource("/posts/publish/{id}")
                    .route(web::patch().to(posts::publish))
                    .default_service(web::to(method_not_supported)),
            )
            .service(
                web::resource("/posts/slug/{slug}")
                    .route(web::get().to(posts::by_slug))
                    .default_service(web::to(method_not_supported)),
            )
            .service(
                web::resource("/posts/{id}")
                    .route(web::get().to(posts::get))
                    .route(web::patch().to(posts::update))
                    .route(web::delete().to(posts::delete))
                    .default_service(web::to(method_not_supported)),
            )
            .service(
                web::resource("/drafts")
                    .route(web::get().to(drafts::list))
                    .default_service(web::to(method_not_supported)),
            )
            .service(
                web::resource("/slugs")
                    .route(web::get().to(slugs::list))
                    .default_service(web::to(method_not_supported)),
            ),
    );
}

/// Fallback for a known resource hit with a method it does not serve.
async fn method_not_supported(req: HttpRequest) -> HttpResponse {
    let mut body = ErrorResponse::method_not_supported(req.method().as_str());
    if let Some(id) = RequestId::of(&req) {
        body = body.with_request_id(id.0);
    }
    HttpResponse::BadRequest().json(body)
}

fn bad_request(req: &HttpRequest, message: String) -> HttpResponse {
    let mut body = ErrorResponse::bad_request(message);
    if let Some(id) = RequestId::of(req) {
        body = body.with_request_id(id.0);
    }
    HttpResponse::BadRequest().json(body)
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("'{raw}' is not a valid post id")))
}
