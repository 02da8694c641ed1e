use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use super::{dashboard, favorite, meal, order, payment, review, role_request, user};
use crate::types::Context;
use std::sync::Arc;

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": "Chef Bazaar server running" })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(health_check))
        .nest("/users", user::get_router())
        .nest("/role-requests", role_request::get_router())
        .nest("/meals", meal::get_router())
        .nest("/orders", order::get_router())
        .nest("/payments", payment::get_router())
        .nest("/reviews", review::get_router())
        .nest("/favorites", favorite::get_router())
        .nest("/dashboard", dashboard::get_router())
}
