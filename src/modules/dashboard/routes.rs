use super::repository;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{modules::auth::middleware::AdminAuth, types::Context};

async fn get_stats(State(ctx): State<Arc<Context>>, _: AdminAuth) -> impl IntoResponse {
    match repository::get_stats(&ctx.db_conn).await {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch stats" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/stats", get(get_stats))
}
