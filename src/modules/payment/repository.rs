use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};

use crate::utils::{
    database::{self, DatabaseConnection},
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "payments";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// One record per provider transaction. The unique index on `transaction_id`
/// is what makes replayed callbacks harmless.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Payment {
    pub transaction_id: String,
    pub session_id: String,
    pub order_id: String,
    pub email: String,
    pub amount: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

pub enum InsertOutcome {
    Recorded(Payment),
    AlreadyRecorded,
}

pub struct CreatePaymentPayload {
    pub transaction_id: String,
    pub session_id: String,
    pub order_id: String,
    pub email: String,
    pub amount: i64,
}

/// Insert-if-absent keyed by the provider transaction id. A duplicate-key
/// write error means another delivery of the same callback got here first;
/// that is success, not failure.
pub async fn create(db: &DatabaseConnection, payload: CreatePaymentPayload) -> Result<InsertOutcome> {
    let payment = Payment {
        transaction_id: payload.transaction_id,
        session_id: payload.session_id,
        order_id: payload.order_id,
        email: payload.email,
        amount: payload.amount,
        created_at: Utc::now(),
    };

    match db
        .collection::<Payment>(COLLECTION)
        .insert_one(&payment, None)
        .await
    {
        Ok(_) => Ok(InsertOutcome::Recorded(payment)),
        Err(err) if database::is_duplicate_key_error(&err) => Ok(InsertOutcome::AlreadyRecorded),
        Err(err) => {
            tracing::error!(
                "Error occurred while recording payment {}: {}",
                payment.transaction_id,
                err
            );
            Err(Error::UnexpectedError)
        }
    }
}

async fn find_many_by_filter(
    db: &DatabaseConnection,
    pagination: Pagination,
    filter: bson::Document,
) -> Result<Paginated<Payment>> {
    let collection = db.collection::<Payment>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting payments: {}", err);
            Error::UnexpectedError
        })?;

    let payments = collection
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
            tracing::error!("Error occurred while fetching payments: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<Payment>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading payments cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        payments,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn find_many(db: &DatabaseConnection, pagination: Pagination) -> Result<Paginated<Payment>> {
    find_many_by_filter(db, pagination, doc! {}).await
}

pub async fn find_many_by_email(
    db: &DatabaseConnection,
    pagination: Pagination,
    email: String,
) -> Result<Paginated<Payment>> {
    find_many_by_filter(db, pagination, doc! { "email": email }).await
}
