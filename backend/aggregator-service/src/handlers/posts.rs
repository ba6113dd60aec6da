/// Post ranking endpoints
///
/// GET /posts?type=latest  - Five newest posts
/// GET /posts?type=popular - Every post sharing the highest comment count
use actix_web::{web, HttpResponse};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::PostsQuery;
use crate::services::Aggregator;

pub async fn get_posts(
    aggregator: web::Data<Aggregator>,
    query: web::Query<PostsQuery>,
) -> Result<HttpResponse> {
    // Rejected before any upstream call is made
    let post_type = query.parse_type().map_err(|e| {
        warn!(post_type = ?query.post_type, "Rejected invalid post type");
        e
    })?;

    info!(post_type = ?post_type, "GET /posts");

    let body = aggregator.posts(post_type).await.map_err(|e| {
        error!(post_type = ?post_type, error = %e, "Failed to compute posts");
        e
    })?;

    Ok(HttpResponse::Ok().json(body))
}
