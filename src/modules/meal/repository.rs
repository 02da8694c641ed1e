use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::utils::{
    database::DatabaseConnection,
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "meals";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// Prices are stored in minor units (cents) to keep them integral through the
/// checkout provider, which expects minor units too.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: i64,
    pub rating: f64,
    pub ingredients: Vec<String>,
    pub estimated_delivery_time: String,
    pub chef_name: String,
    pub chef_email: String,
    pub chef_id: String,
    pub hidden: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::datetime::option_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct CreateMealPayload {
    pub name: String,
    pub image: String,
    pub price: i64,
    pub rating: f64,
    pub ingredients: Vec<String>,
    pub estimated_delivery_time: String,
    pub chef_name: String,
    pub chef_email: String,
    pub chef_id: String,
}

pub async fn create(db: &DatabaseConnection, payload: CreateMealPayload) -> Result<Meal> {
    let meal = Meal {
        id: Ulid::new().to_string(),
        name: payload.name,
        image: payload.image,
        price: payload.price,
        rating: payload.rating,
        ingredients: payload.ingredients,
        estimated_delivery_time: payload.estimated_delivery_time,
        chef_name: payload.chef_name,
        chef_email: payload.chef_email,
        chef_id: payload.chef_id,
        hidden: false,
        created_at: Utc::now(),
        updated_at: None,
    };

    db.collection::<Meal>(COLLECTION)
        .insert_one(&meal, None)
        .await
        .map(|_| meal)
        .map_err(|err| {
            tracing::error!("Error occurred while creating meal: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_id(db: &DatabaseConnection, id: String) -> Result<Option<Meal>> {
    db.collection::<Meal>(COLLECTION)
        .find_one(doc! { "id": &id }, None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching meal with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[derive(Deserialize, Clone)]
pub enum PriceSort {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

pub struct FindManyFilters {
    pub chef_email: Option<String>,
    pub price_sort: Option<PriceSort>,
}

/// Public listing: meals hidden by fraud moderation never show up.
pub async fn find_many(
    db: &DatabaseConnection,
    pagination: Pagination,
    filters: FindManyFilters,
) -> Result<Paginated<Meal>> {
    let mut filter = doc! { "hidden": false };

    if let Some(chef_email) = filters.chef_email {
        filter.insert("chef_email", chef_email);
    }

    let sort = match filters.price_sort {
        Some(PriceSort::Ascending) => doc! { "price": 1 },
        Some(PriceSort::Descending) => doc! { "price": -1 },
        None => doc! { "created_at": -1 },
    };

    let collection = db.collection::<Meal>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting meals: {}", err);
            Error::UnexpectedError
        })?;

    let meals = collection
        .find(
            filter,
            FindOptions::builder()
                .sort(sort)
                .skip(pagination.skip())
                .limit(pagination.limit())
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching meals: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<Meal>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading meals cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        meals,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

pub struct UpdateMealPayload {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub ingredients: Option<Vec<String>>,
    pub estimated_delivery_time: Option<String>,
}

pub async fn update_by_id(
    db: &DatabaseConnection,
    id: String,
    payload: UpdateMealPayload,
) -> Result<Option<Meal>> {
    let mut update = doc! { "updated_at": bson::DateTime::from_chrono(Utc::now()) };

    if let Some(name) = payload.name {
        update.insert("name", name);
    }
    if let Some(image) = payload.image {
        update.insert("image", image);
    }
    if let Some(price) = payload.price {
        update.insert("price", price);
    }
    if let Some(ingredients) = payload.ingredients {
        update.insert("ingredients", ingredients);
    }
    if let Some(estimated_delivery_time) = payload.estimated_delivery_time {
        update.insert("estimated_delivery_time", estimated_delivery_time);
    }

    db.collection::<Meal>(COLLECTION)
        .find_one_and_update(
            doc! { "id": &id },
            doc! { "$set": update },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while updating meal {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn delete_by_id(db: &DatabaseConnection, id: String) -> Result<bool> {
    db.collection::<Meal>(COLLECTION)
        .delete_one(doc! { "id": &id }, None)
        .await
        .map(|result| result.deleted_count > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting meal {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn set_hidden_by_chef_email(
    db: &DatabaseConnection,
    chef_email: String,
    hidden: bool,
) -> Result<u64> {
    db.collection::<Meal>(COLLECTION)
        .update_many(
            doc! { "chef_email": &chef_email },
            doc! { "$set": { "hidden": hidden } },
            None,
        )
        .await
        .map(|result| result.modified_count)
        .map_err(|err| {
            tracing::error!(
                "Error occurred while updating meal visibility for chef {}: {}",
                chef_email,
                err
            );
            Error::UnexpectedError
        })
}
