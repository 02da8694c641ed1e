use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::utils::{
    database::{self, DatabaseConnection},
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "favorites";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    AlreadyFavorited,
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Favorite {
    pub id: String,
    pub owner_email: String,
    pub meal_id: String,
    pub meal_name: String,
    pub image: String,
    pub price: i64,
    pub chef_name: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

pub struct CreateFavoritePayload {
    pub owner_email: String,
    pub meal_id: String,
    pub meal_name: String,
    pub image: String,
    pub price: i64,
    pub chef_name: String,
}

/// The (owner_email, meal_id) unique index turns a double-tap into a conflict
/// instead of a second document.
pub async fn create(db: &DatabaseConnection, payload: CreateFavoritePayload) -> Result<Favorite> {
    let favorite = Favorite {
        id: Ulid::new().to_string(),
        owner_email: payload.owner_email,
        meal_id: payload.meal_id,
        meal_name: payload.meal_name,
        image: payload.image,
        price: payload.price,
        chef_name: payload.chef_name,
        created_at: Utc::now(),
    };

    db.collection::<Favorite>(COLLECTION)
        .insert_one(&favorite, None)
        .await
        .map(|_| favorite)
        .map_err(|err| {
            if database::is_duplicate_key_error(&err) {
                return Error::AlreadyFavorited;
            }

            tracing::error!("Error occurred while creating favorite: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_many_by_owner(
    db: &DatabaseConnection,
    pagination: Pagination,
    owner_email: String,
) -> Result<Paginated<Favorite>> {
    let filter = doc! { "owner_email": owner_email };
    let collection = db.collection::<Favorite>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting favorites: {}", err);
            Error::UnexpectedError
        })?;

    let favorites = collection
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
            tracing::error!("Error occurred while fetching favorites: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<Favorite>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading favorites cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        favorites,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn delete_by_id_and_owner(
    db: &DatabaseConnection,
    id: String,
    owner_email: String,
) -> Result<bool> {
    db.collection::<Favorite>(COLLECTION)
        .delete_one(doc! { "id": &id, "owner_email": owner_email }, None)
        .await
        .map(|result| result.deleted_count > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting favorite {}: {}", id, err);
            Error::UnexpectedError
        })
}
