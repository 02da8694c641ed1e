use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::utils::database::DatabaseConnection;

pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize)]
pub struct Stats {
    pub users: u64,
    pub meals: u64,
    pub orders: u64,
    pub payments: u64,
    pub revenue: i64,
}

async fn count(db: &DatabaseConnection, collection: &str) -> Result<u64, Error> {
    db.collection::<Document>(collection)
        .count_documents(doc! {}, None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting {}: {}", collection, err);
            Error::UnexpectedError
        })
}

/// Revenue is a sum over the payments collection. Payments are keyed uniquely
/// by provider transaction id, so replayed checkout callbacks cannot inflate
/// this number.
async fn total_revenue(db: &DatabaseConnection) -> Result<i64, Error> {
    let mut cursor = db
        .collection::<Document>("payments")
        .aggregate(
            [doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } }],
            None,
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while aggregating revenue: {}", err);
            Error::UnexpectedError
        })?;

    let total = cursor
        .try_next()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading revenue aggregate: {}", err);
            Error::UnexpectedError
        })?
        .map(|document| document.get_i64("total").unwrap_or_default())
        .unwrap_or_default();

    Ok(total)
}

pub async fn get_stats(db: &DatabaseConnection) -> Result<Stats, Error> {
    Ok(Stats {
        users: count(db, "users").await?,
        meals: count(db, "meals").await?,
        orders: count(db, "orders").await?,
        payments: count(db, "payments").await?,
        revenue: total_revenue(db).await?,
    })
}
