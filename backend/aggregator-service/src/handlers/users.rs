/// User ranking endpoints
///
/// GET /users/top - Users with the most posts
use actix_web::{web, HttpResponse};
use tracing::{error, info};

use crate::error::Result;
use crate::models::TopUsersResponse;
use crate::services::Aggregator;

/// GET /users/top
/// Returns up to five users ordered by post count, most first
pub async fn get_top_users(aggregator: web::Data<Aggregator>) -> Result<HttpResponse> {
    info!("GET /users/top");

    let top_users = aggregator.top_users().await.map_err(|e| {
        error!(error = %e, "Failed to compute top users");
        e
    })?;

    info!(returned = top_users.len(), "Top users computed");
    Ok(HttpResponse::Ok().json(TopUsersResponse { top_users }))
}
