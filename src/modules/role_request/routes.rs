use super::{
    repository::{self, RequestedRole},
    service,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    modules::auth::middleware::{AdminAuth, UserAuth},
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize)]
struct CreateRoleRequestPayload {
    role: RequestedRole,
}

async fn create_role_request(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateRoleRequestPayload>,
) -> impl IntoResponse {
    match repository::create(
        &ctx.db_conn,
        repository::CreateRoleRequestPayload {
            email: auth.user.email,
            requester_name: auth.user.name,
            requested_role: payload.role,
        },
    )
    .await
    {
        Ok(request) => (StatusCode::CREATED, Json(json!(request))),
        Err(repository::Error::DuplicatePendingRequest) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "You already have a pending role request" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create role request" })),
        ),
    }
}

async fn get_role_requests(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn, pagination).await {
        Ok(paginated_requests) => (StatusCode::OK, Json(json!(paginated_requests))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch role requests" })),
        ),
    }
}

#[derive(Deserialize)]
struct DecideRoleRequestPayload {
    decision: service::Decision,
}

async fn decide_role_request(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<DecideRoleRequestPayload>,
) -> impl IntoResponse {
    match service::decide_role_request(
        ctx.clone(),
        service::DecideRoleRequestPayload {
            request_id: id,
            decision: payload.decision,
        },
    )
    .await
    {
        Ok(request) => (StatusCode::OK, Json(json!(request))),
        Err(service::Error::RequestNotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Role request not found" })),
        ),
        Err(service::Error::AlreadyDecided) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Role request has already been decided" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to decide role request" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_role_request))
        .route("/", get(get_role_requests))
        .route("/:id", patch(decide_role_request))
}
