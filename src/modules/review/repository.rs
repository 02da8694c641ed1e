use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::utils::{
    database::DatabaseConnection,
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "reviews";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Review {
    pub id: String,
    pub meal_id: String,
    pub reviewer_email: String,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

pub struct CreateReviewPayload {
    pub meal_id: String,
    pub reviewer_email: String,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: String,
}

pub async fn create(db: &DatabaseConnection, payload: CreateReviewPayload) -> Result<Review> {
    let review = Review {
        id: Ulid::new().to_string(),
        meal_id: payload.meal_id,
        reviewer_email: payload.reviewer_email,
        reviewer_name: payload.reviewer_name,
        rating: payload.rating,
        comment: payload.comment,
        created_at: Utc::now(),
    };

    db.collection::<Review>(COLLECTION)
        .insert_one(&review, None)
        .await
        .map(|_| review)
        .map_err(|err| {
            tracing::error!("Error occurred while creating review: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_many_by_meal(
    db: &DatabaseConnection,
    pagination: Pagination,
    meal_id: String,
) -> Result<Paginated<Review>> {
    let filter = doc! { "meal_id": meal_id };
    let collection = db.collection::<Review>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting reviews: {}", err);
            Error::UnexpectedError
        })?;

    let reviews = collection
        .find(
            filter,
            FindOptions::builder()
                .sort(doc! { "created_at": -1 })
                .skip(pagination.skip())
                .limit(pagination.limit())
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching reviews: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<Review>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading reviews cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        reviews,
        total,
        pagination.page,
        pagination.per_page,
    ))
}
