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

const COLLECTION: &str = "users";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "CHEF")]
    Chef,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl ToString for Role {
    fn to_string(&self) -> String {
        match self {
            Role::User => String::from("USER"),
            Role::Chef => String::from("CHEF"),
            Role::Admin => String::from("ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "CHEF" => Ok(Role::Chef),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("'{}' is not a valid Role", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AccountStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FRAUD")]
    Fraud,
}

impl ToString for AccountStatus {
    fn to_string(&self) -> String {
        match self {
            AccountStatus::Active => String::from("ACTIVE"),
            AccountStatus::Fraud => String::from("FRAUD"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "FRAUD" => Ok(AccountStatus::Fraud),
            _ => Err(format!("'{}' is not a valid AccountStatus", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub chef_id: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::datetime::option_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn is_admin(user: &User) -> bool {
    user.role == Role::Admin
}

pub fn is_chef(user: &User) -> bool {
    user.role == Role::Chef
}

pub struct UpsertUserPayload {
    pub email: String,
    pub name: String,
}

/// Sign-in upsert: first sign-in inserts a fresh USER record, subsequent
/// sign-ins only refresh the display name and `updated_at`.
pub async fn upsert(db: &DatabaseConnection, payload: UpsertUserPayload) -> Result<User> {
    let now = bson::DateTime::from_chrono(Utc::now());

    db.collection::<User>(COLLECTION)
        .find_one_and_update(
            doc! { "email": &payload.email },
            doc! {
                "$set": { "name": &payload.name, "updated_at": now },
                "$setOnInsert": {
                    "id": Ulid::new().to_string(),
                    "email": &payload.email,
                    "role": Role::User.to_string(),
                    "status": AccountStatus::Active.to_string(),
                    "chef_id": bson::Bson::Null,
                    "created_at": now,
                },
            },
            FindOneAndUpdateOptions::builder()
                .upsert(true)
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while upserting user {}: {}",
                payload.email,
                err
            );
            Error::UnexpectedError
        })?
        .ok_or(Error::UnexpectedError)
}

pub async fn find_by_email(db: &DatabaseConnection, email: String) -> Result<Option<User>> {
    db.collection::<User>(COLLECTION)
        .find_one(doc! { "email": &email }, None)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching user with email {}: {}",
                email,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_id(db: &DatabaseConnection, id: String) -> Result<Option<User>> {
    db.collection::<User>(COLLECTION)
        .find_one(doc! { "id": &id }, None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching user with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub struct FindManyFilters {
    pub email: Option<String>,
}

pub async fn find_many(
    db: &DatabaseConnection,
    pagination: Pagination,
    filters: FindManyFilters,
) -> Result<Paginated<User>> {
    let filter = match filters.email {
        Some(email) => doc! { "email": { "$regex": email, "$options": "i" } },
        None => doc! {},
    };

    let collection = db.collection::<User>(COLLECTION);

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting users: {}", err);
            Error::UnexpectedError
        })?;

    let users = collection
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
            tracing::error!("Error occurred while fetching users: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<User>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading users cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        users,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

pub struct SetRolePayload {
    pub email: String,
    pub role: Role,
    pub chef_id: Option<String>,
}

pub async fn set_role(db: &DatabaseConnection, payload: SetRolePayload) -> Result<Option<User>> {
    let mut update = doc! {
        "role": payload.role.to_string(),
        "updated_at": bson::DateTime::from_chrono(Utc::now()),
    };

    if let Some(chef_id) = payload.chef_id {
        update.insert("chef_id", chef_id);
    }

    db.collection::<User>(COLLECTION)
        .find_one_and_update(
            doc! { "email": &payload.email },
            doc! { "$set": update },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while updating role for {}: {}",
                payload.email,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn set_status(
    db: &DatabaseConnection,
    id: String,
    status: AccountStatus,
) -> Result<Option<User>> {
    db.collection::<User>(COLLECTION)
        .find_one_and_update(
            doc! { "id": &id },
            doc! { "$set": {
                "status": status.to_string(),
                "updated_at": bson::DateTime::from_chrono(Utc::now()),
            } },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while updating status for user {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_from_stored_strings() {
        assert_eq!("CHEF".parse::<Role>(), Ok(Role::Chef));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn account_status_round_trips() {
        for status in [AccountStatus::Active, AccountStatus::Fraud] {
            assert_eq!(status.to_string().parse::<AccountStatus>(), Ok(status));
        }
    }

    #[test]
    fn user_serializes_enums_as_stored_strings() {
        let value = serde_json::to_value(Role::Chef).unwrap();
        assert_eq!(value, serde_json::json!("CHEF"));

        let value = serde_json::to_value(AccountStatus::Fraud).unwrap();
        assert_eq!(value, serde_json::json!("FRAUD"));
    }
}
