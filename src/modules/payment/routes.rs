use super::{repository, service};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    modules::{
        auth::middleware::{Auth, UserAuth},
        order, user,
    },
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize)]
struct CheckoutPayload {
    order_id: String,
}

async fn checkout(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CheckoutPayload>,
) -> impl IntoResponse {
    let order = match order::repository::find_by_id(&ctx.db_conn, payload.order_id).await {
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

    if order.owner_email != auth.user.email {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "You do not own this order" })),
        );
    }

    match service::initialize_checkout_for_order(
        ctx.clone(),
        service::InitializeCheckoutPayload {
            order,
            payer: auth.user,
        },
    )
    .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({ "session_id": session.id, "url": session.url })),
        ),
        Err(service::Error::AlreadyPaid) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Order has already been paid for" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to initiate checkout" })),
        ),
    }
}

#[derive(Deserialize)]
struct ConfirmQuery {
    session_id: String,
}

async fn confirm_checkout(
    State(ctx): State<Arc<Context>>,
    _: Auth,
    Query(query): Query<ConfirmQuery>,
) -> impl IntoResponse {
    match service::reconcile_checkout(ctx.clone(), query.session_id).await {
        Ok(service::ReconcileOutcome::Completed) => (
            StatusCode::OK,
            Json(json!({ "paid": true, "message": "Payment confirmed" })),
        ),
        Ok(service::ReconcileOutcome::NotCompleted) => (
            StatusCode::OK,
            Json(json!({ "paid": false, "message": "Payment not completed" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to confirm payment" })),
        ),
    }
}

async fn get_payments(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    let payments = match user::repository::is_admin(&auth.user) {
        true => repository::find_many(&ctx.db_conn, pagination).await,
        false => repository::find_many_by_email(&ctx.db_conn, pagination, auth.user.email).await,
    };

    match payments {
        Ok(paginated_payments) => (StatusCode::OK, Json(json!(paginated_payments))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch payments" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_payments))
        .route("/checkout", post(checkout))
        .route("/checkout/confirm", get(confirm_checkout))
}
