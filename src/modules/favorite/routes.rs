use super::repository;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    modules::{auth::middleware::UserAuth, meal},
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize)]
struct CreateFavoritePayload {
    meal_id: String,
}

async fn create_favorite(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateFavoritePayload>,
) -> impl IntoResponse {
    let meal = match meal::repository::find_by_id(&ctx.db_conn, payload.meal_id).await {
        Ok(Some(meal)) => meal,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Meal not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch meal" })),
            )
        }
    };

    match repository::create(
        &ctx.db_conn,
        repository::CreateFavoritePayload {
            owner_email: auth.user.email,
            meal_id: meal.id,
            meal_name: meal.name,
            image: meal.image,
            price: meal.price,
            chef_name: meal.chef_name,
        },
    )
    .await
    {
        Ok(favorite) => (StatusCode::CREATED, Json(json!(favorite))),
        Err(repository::Error::AlreadyFavorited) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Meal is already in your favorites" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add favorite" })),
        ),
    }
}

async fn get_favorites(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many_by_owner(&ctx.db_conn, pagination, auth.user.email).await {
        Ok(paginated_favorites) => (StatusCode::OK, Json(json!(paginated_favorites))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch favorites" })),
        ),
    }
}

async fn delete_favorite(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_by_id_and_owner(&ctx.db_conn, id, auth.user.email).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Favorite removed successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Favorite not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove favorite" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_favorite))
        .route("/", get(get_favorites))
        .route("/:id", delete(delete_favorite))
}
