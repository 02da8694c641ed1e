use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

use crate::utils::{
    database::DatabaseConnection,
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "orders";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum OrderStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl ToString for OrderStatus {
    fn to_string(&self) -> String {
        match self {
            OrderStatus::Pending => String::from("PENDING"),
            OrderStatus::Delivered => String::from("DELIVERED"),
            OrderStatus::Cancelled => String::from("CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("'{}' is not a valid OrderStatus", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PaymentStatus {
    #[serde(rename = "UNPAID")]
    Unpaid,
    #[serde(rename = "PAID")]
    Paid,
}

impl ToString for PaymentStatus {
    fn to_string(&self) -> String {
        match self {
            PaymentStatus::Unpaid => String::from("UNPAID"),
            PaymentStatus::Paid => String::from("PAID"),
        }
    }
}

/// The chef hands the order over; nothing else moves an order forward.
pub fn is_valid_chef_transition(from: &OrderStatus, to: &OrderStatus) -> bool {
    matches!((from, to), (OrderStatus::Pending, OrderStatus::Delivered))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Order {
    pub id: String,
    pub meal_id: String,
    pub meal_name: String,
    pub chef_email: String,
    pub chef_id: String,
    pub owner_email: String,
    pub quantity: i32,
    pub address: String,
    pub price: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::datetime::option_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct CreateOrderPayload {
    pub meal_id: String,
    pub meal_name: String,
    pub chef_email: String,
    pub chef_id: String,
    pub owner_email: String,
    pub quantity: i32,
    pub address: String,
    pub price: i64,
}

pub async fn create(db: &DatabaseConnection, payload: CreateOrderPayload) -> Result<Order> {
    let order = Order {
        id: Ulid::new().to_string(),
        meal_id: payload.meal_id,
        meal_name: payload.meal_name,
        chef_email: payload.chef_email,
        chef_id: payload.chef_id,
        owner_email: payload.owner_email,
        quantity: payload.quantity,
        address: payload.address,
        price: payload.price,
        order_status: OrderStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        created_at: Utc::now(),
        updated_at: None,
    };

    db.collection::<Order>(COLLECTION)
        .insert_one(&order, None)
        .await
        .map(|_| order)
        .map_err(|err| {
            tracing::error!("Error occurred while creating order: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_id(db: &DatabaseConnection, id: String) -> Result<Option<Order>> {
    db.collection::<Order>(COLLECTION)
        .find_one(doc! { "id": &id }, None)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching order with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

async fn find_many_by_filter(
    db: &DatabaseConnection,
    pagination: Pagination,
    filter: bson::Document,
) -> Result<Paginated<Order>> {
    let collection = db.collection::<Order>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting orders: {}", err);
            Error::UnexpectedError
        })?;

    let orders = collection
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
            tracing::error!("Error occurred while fetching orders: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<Order>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading orders cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        orders,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn find_many_by_owner(
    db: &DatabaseConnection,
    pagination: Pagination,
    owner_email: String,
) -> Result<Paginated<Order>> {
    find_many_by_filter(db, pagination, doc! { "owner_email": owner_email }).await
}

pub async fn find_many_by_chef(
    db: &DatabaseConnection,
    pagination: Pagination,
    chef_email: String,
) -> Result<Paginated<Order>> {
    find_many_by_filter(db, pagination, doc! { "chef_email": chef_email }).await
}

/// Chef delivery handover. The PENDING filter keeps a replayed update from
/// rewriting an order that already moved on.
pub async fn mark_as_delivered(
    db: &DatabaseConnection,
    id: String,
    chef_email: String,
) -> Result<Option<Order>> {
    db.collection::<Order>(COLLECTION)
        .find_one_and_update(
            doc! {
                "id": &id,
                "chef_email": chef_email,
                "order_status": OrderStatus::Pending.to_string(),
            },
            doc! { "$set": {
                "order_status": OrderStatus::Delivered.to_string(),
                "updated_at": bson::DateTime::from_chrono(Utc::now()),
            } },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while delivering order {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Marking paid is a plain $set: replaying it leaves the order PAID, which is
/// exactly what checkout reconciliation needs.
pub async fn mark_as_paid(db: &DatabaseConnection, id: String) -> Result<Option<Order>> {
    db.collection::<Order>(COLLECTION)
        .find_one_and_update(
            doc! { "id": &id },
            doc! { "$set": {
                "payment_status": PaymentStatus::Paid.to_string(),
                "updated_at": bson::DateTime::from_chrono(Utc::now()),
            } },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while marking order {} as paid: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

/// Owners may only walk away from orders that are still pending and unpaid.
pub async fn delete_pending_unpaid(
    db: &DatabaseConnection,
    id: String,
    owner_email: String,
) -> Result<bool> {
    db.collection::<Order>(COLLECTION)
        .delete_one(
            doc! {
                "id": &id,
                "owner_email": owner_email,
                "order_status": OrderStatus::Pending.to_string(),
                "payment_status": PaymentStatus::Unpaid.to_string(),
            },
            None,
        )
        .await
        .map(|result| result.deleted_count > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting order {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chef_may_only_deliver_pending_orders() {
        assert!(is_valid_chef_transition(
            &OrderStatus::Pending,
            &OrderStatus::Delivered
        ));
        assert!(!is_valid_chef_transition(
            &OrderStatus::Delivered,
            &OrderStatus::Delivered
        ));
        assert!(!is_valid_chef_transition(
            &OrderStatus::Cancelled,
            &OrderStatus::Delivered
        ));
        assert!(!is_valid_chef_transition(
            &OrderStatus::Pending,
            &OrderStatus::Cancelled
        ));
    }

    #[test]
    fn order_status_parses_from_stored_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status.clone()));
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }
}
