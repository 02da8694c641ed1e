use super::repository::{self, AccountStatus};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    modules::{
        auth::middleware::{AdminAuth, Auth},
        meal,
    },
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize)]
struct UpsertUserPayload {
    name: Option<String>,
}

async fn upsert_user(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Json(payload): Json<UpsertUserPayload>,
) -> impl IntoResponse {
    let name = payload
        .name
        .or(auth.claims.name)
        .unwrap_or_else(|| auth.claims.email.clone());

    match repository::upsert(
        &ctx.db_conn,
        repository::UpsertUserPayload {
            email: auth.claims.email,
            name,
        },
    )
    .await
    {
        Ok(user) => (StatusCode::OK, Json(json!(user))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to save user" })),
        ),
    }
}

#[derive(Deserialize)]
struct Filters {
    email: Option<String>,
}

async fn get_users(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    match repository::find_many(
        &ctx.db_conn,
        pagination,
        repository::FindManyFilters {
            email: filters.email,
        },
    )
    .await
    {
        Ok(paginated_users) => (StatusCode::OK, Json(json!(paginated_users))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch users" })),
        ),
    }
}

async fn get_user_role(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(email): Path<String>,
) -> impl IntoResponse {
    if auth.claims.email != email {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Access denied" })),
        );
    }

    match repository::find_by_email(&ctx.db_conn, email).await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!({ "role": user.role }))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch user" })),
        ),
    }
}

#[derive(Deserialize)]
struct UpdateUserStatusPayload {
    status: AccountStatus,
}

async fn update_user_status(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserStatusPayload>,
) -> impl IntoResponse {
    let user = match repository::set_status(&ctx.db_conn, id, payload.status.clone()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update user status" })),
            )
        }
    };

    // A chef flagged as fraudulent has their meals pulled from listings; the
    // meals come back if the account is reinstated.
    if repository::is_chef(&user) {
        let hidden = payload.status == AccountStatus::Fraud;
        if meal::repository::set_hidden_by_chef_email(&ctx.db_conn, user.email.clone(), hidden)
            .await
            .is_err()
        {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update chef listings" })),
            );
        }
    }

    (StatusCode::OK, Json(json!(user)))
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(upsert_user))
        .route("/", get(get_users))
        .route("/:email/role", get(get_user_role))
        .route("/:id/status", patch(update_user_status))
}
