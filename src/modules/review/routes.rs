use super::repository;
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
use validator::Validate;

use crate::{
    modules::auth::middleware::UserAuth,
    types::Context,
    utils::pagination::Pagination,
};

#[derive(Deserialize, Validate)]
struct CreateReviewPayload {
    meal_id: String,
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    comment: String,
}

async fn create_review(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateReviewPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })));
    }

    match repository::create(
        &ctx.db_conn,
        repository::CreateReviewPayload {
            meal_id: payload.meal_id,
            reviewer_email: auth.user.email,
            reviewer_name: auth.user.name,
            rating: payload.rating,
            comment: payload.comment,
        },
    )
    .await
    {
        Ok(review) => (StatusCode::CREATED, Json(json!(review))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create review" })),
        ),
    }
}

#[derive(Deserialize)]
struct Filters {
    meal_id: String,
}

async fn get_reviews(
    State(ctx): State<Arc<Context>>,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    match repository::find_many_by_meal(&ctx.db_conn, pagination, filters.meal_id).await {
        Ok(paginated_reviews) => (StatusCode::OK, Json(json!(paginated_reviews))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch reviews" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_review))
        .route("/", get(get_reviews))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_rating_must_be_between_one_and_five() {
        let valid = CreateReviewPayload {
            meal_id: "01J0ABCDEF".to_string(),
            rating: 5,
            comment: "Delicious".to_string(),
        };
        assert!(valid.validate().is_ok());

        let too_low = CreateReviewPayload { rating: 0, ..valid_payload() };
        assert!(too_low.validate().is_err());

        let too_high = CreateReviewPayload { rating: 6, ..valid_payload() };
        assert!(too_high.validate().is_err());
    }

    fn valid_payload() -> CreateReviewPayload {
        CreateReviewPayload {
            meal_id: "01J0ABCDEF".to_string(),
            rating: 4,
            comment: "Good".to_string(),
        }
    }
}
