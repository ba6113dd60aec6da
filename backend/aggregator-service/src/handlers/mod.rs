pub mod posts;
pub mod users;

pub use posts::get_posts;
pub use users::get_top_users;

use actix_web::{web, HttpResponse};

use crate::error::AppError;

/// Register every route of the service.
///
/// Query strings that fail to parse at all get the same 400 body as an
/// unknown `type` value.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default().error_handler(|_, _| AppError::InvalidPostType.into()),
    )
    .route("/health", web::get().to(health_check))
    .route("/users/top", web::get().to(get_top_users))
    .route("/posts", web::get().to(get_posts));
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
