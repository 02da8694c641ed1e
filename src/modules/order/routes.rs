use super::repository::{self, OrderStatus};
use axum::{
    extract::{Json, Path, State},
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
        meal,
    },
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize, Validate)]
struct CreateOrderPayload {
    meal_id: String,
    #[validate(range(min = 1, max = 100))]
    quantity: i32,
    #[validate(length(min = 1))]
    address: String,
}

async fn create_order(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateOrderPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })));
    }

    let meal = match meal::repository::find_by_id(&ctx.db_conn, payload.meal_id.clone()).await {
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

    if meal.hidden {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Meal not found" })),
        );
    }

    // Meal details are snapshotted onto the order so later edits to the meal
    // never change what was bought.
    match repository::create(
        &ctx.db_conn,
        repository::CreateOrderPayload {
            meal_id: meal.id,
            meal_name: meal.name,
            chef_email: meal.chef_email,
            chef_id: meal.chef_id,
            owner_email: auth.user.email,
            quantity: payload.quantity,
            address: payload.address,
            price: meal.price * i64::from(payload.quantity),
        },
    )
    .await
    {
        Ok(order) => (StatusCode::CREATED, Json(json!(order))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create order" })),
        ),
    }
}

async fn get_orders(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many_by_owner(&ctx.db_conn, pagination, auth.user.email).await {
        Ok(paginated_orders) => (StatusCode::OK, Json(json!(paginated_orders))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch orders" })),
        ),
    }
}

async fn get_incoming_orders(
    State(ctx): State<Arc<Context>>,
    auth: ChefAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many_by_chef(&ctx.db_conn, pagination, auth.user.email).await {
        Ok(paginated_orders) => (StatusCode::OK, Json(json!(paginated_orders))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch orders" })),
        ),
    }
}

#[derive(Deserialize)]
struct UpdateOrderStatusPayload {
    status: OrderStatus,
}

async fn update_order_status(
    State(ctx): State<Arc<Context>>,
    auth: ChefAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> impl IntoResponse {
    let order = match repository::find_by_id(&ctx.db_conn, id.clone()).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            )
        }
    };

    if order.chef_email != auth.user.email {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "This order does not belong to your kitchen" })),
        );
    }

    if !repository::is_valid_chef_transition(&order.order_status, &payload.status) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid status transition" })),
        );
    }

    match repository::mark_as_delivered(&ctx.db_conn, id, auth.user.email).await {
        Ok(Some(order)) => (StatusCode::OK, Json(json!(order))),
        Ok(None) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Order is no longer pending" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update order status" })),
        ),
    }
}

async fn delete_order(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_pending_unpaid(&ctx.db_conn, id, auth.user.email).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Order cancelled successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No cancellable order found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to cancel order" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(get_orders))
        .route("/incoming", get(get_incoming_orders))
        .route("/:id/status", patch(update_order_status))
        .route("/:id", delete(delete_order))
}
