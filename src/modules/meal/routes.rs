use super::repository::{self, PriceSort};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    modules::{
        auth::middleware::{ChefAuth, UserAuth},
        user,
    },
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize, Validate)]
struct CreateMealPayload {
    #[validate(length(min = 1))]
    name: String,
    image: String,
    #[validate(range(min = 1))]
    price: i64,
    #[validate(range(min = 0.0, max = 5.0))]
    rating: f64,
    ingredients: Vec<String>,
    estimated_delivery_time: String,
}

async fn create_meal(
    State(ctx): State<Arc<Context>>,
    auth: ChefAuth,
    Json(payload): Json<CreateMealPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })));
    }

    let chef_id = match auth.user.chef_id.clone() {
        Some(chef_id) => chef_id,
        None => {
            tracing::error!("Chef {} has no chef id assigned", auth.user.email);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create meal" })),
            );
        }
    };

    match repository::create(
        &ctx.db_conn,
        repository::CreateMealPayload {
            name: payload.name,
            image: payload.image,
            price: payload.price,
            rating: payload.rating,
            ingredients: payload.ingredients,
            estimated_delivery_time: payload.estimated_delivery_time,
            chef_name: auth.user.name,
            chef_email: auth.user.email,
            chef_id,
        },
    )
    .await
    {
        Ok(meal) => (StatusCode::CREATED, Json(json!(meal))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create meal" })),
        ),
    }
}

#[derive(Deserialize)]
struct Filters {
    chef_email: Option<String>,
    sort_price: Option<PriceSort>,
}

async fn get_meals(
    State(ctx): State<Arc<Context>>,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    match repository::find_many(
        &ctx.db_conn,
        pagination,
        repository::FindManyFilters {
            chef_email: filters.chef_email,
            price_sort: filters.sort_price,
        },
    )
    .await
    {
        Ok(paginated_meals) => (StatusCode::OK, Json(json!(paginated_meals))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch meals" })),
        ),
    }
}

async fn get_meal_by_id(
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::find_by_id(&ctx.db_conn, id).await {
        Ok(Some(meal)) => (StatusCode::OK, Json(json!(meal))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Meal not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch meal" })),
        ),
    }
}

#[derive(Deserialize)]
struct UpdateMealPayload {
    name: Option<String>,
    image: Option<String>,
    price: Option<i64>,
    ingredients: Option<Vec<String>>,
    estimated_delivery_time: Option<String>,
}

async fn update_meal_by_id(
    State(ctx): State<Arc<Context>>,
    auth: ChefAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateMealPayload>,
) -> impl IntoResponse {
    let meal = match repository::find_by_id(&ctx.db_conn, id.clone()).await {
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

    if meal.chef_email != auth.user.email {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You do not own this meal" })),
        );
    }

    match repository::update_by_id(
        &ctx.db_conn,
        id,
        repository::UpdateMealPayload {
            name: payload.name,
            image: payload.image,
            price: payload.price,
            ingredients: payload.ingredients,
            estimated_delivery_time: payload.estimated_delivery_time,
        },
    )
    .await
    {
        Ok(Some(meal)) => (StatusCode::OK, Json(json!(meal))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Meal not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update meal" })),
        ),
    }
}

async fn delete_meal_by_id(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let meal = match repository::find_by_id(&ctx.db_conn, id.clone()).await {
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

    let allowed = user::repository::is_admin(&auth.user) || meal.chef_email == auth.user.email;
    if !allowed {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You do not own this meal" })),
        );
    }

    match repository::delete_by_id(&ctx.db_conn, id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Meal deleted successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Meal not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete meal" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_meal))
        .route("/", get(get_meals))
        .route("/:id", get(get_meal_by_id))
        .route("/:id", patch(update_meal_by_id))
        .route("/:id", delete(delete_meal_by_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_payload_rejects_zero_price() {
        let payload = CreateMealPayload {
            name: "Jollof rice".to_string(),
            image: "https://example.com/jollof.png".to_string(),
            price: 0,
            rating: 4.5,
            ingredients: vec!["rice".to_string()],
            estimated_delivery_time: "45 minutes".to_string(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn meal_payload_rejects_out_of_range_rating() {
        let payload = CreateMealPayload {
            name: "Jollof rice".to_string(),
            image: "https://example.com/jollof.png".to_string(),
            price: 1500,
            rating: 5.5,
            ingredients: vec![],
            estimated_delivery_time: "45 minutes".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
