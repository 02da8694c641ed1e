use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ulid::Ulid;

use crate::modules::user::repository::Role;
use crate::utils::{
    database::{self, DatabaseConnection},
    pagination::{Paginated, Pagination},
};

const COLLECTION: &str = "role_requests";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    DuplicatePendingRequest,
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum RequestedRole {
    #[serde(rename = "CHEF")]
    Chef,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl ToString for RequestedRole {
    fn to_string(&self) -> String {
        match self {
            RequestedRole::Chef => String::from("CHEF"),
            RequestedRole::Admin => String::from("ADMIN"),
        }
    }
}

impl From<RequestedRole> for Role {
    fn from(requested: RequestedRole) -> Self {
        match requested {
            RequestedRole::Chef => Role::Chef,
            RequestedRole::Admin => Role::Admin,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum RoleRequestStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl ToString for RoleRequestStatus {
    fn to_string(&self) -> String {
        match self {
            RoleRequestStatus::Pending => String::from("PENDING"),
            RoleRequestStatus::Approved => String::from("APPROVED"),
            RoleRequestStatus::Rejected => String::from("REJECTED"),
        }
    }
}

impl FromStr for RoleRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RoleRequestStatus::Pending),
            "APPROVED" => Ok(RoleRequestStatus::Approved),
            "REJECTED" => Ok(RoleRequestStatus::Rejected),
            _ => Err(format!("'{}' is not a valid RoleRequestStatus", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RoleRequest {
    pub id: String,
    pub email: String,
    pub requester_name: String,
    pub requested_role: RequestedRole,
    pub status: RoleRequestStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::utils::datetime::option_chrono_datetime_as_bson_datetime")]
    pub decided_at: Option<DateTime<Utc>>,
}

pub struct CreateRoleRequestPayload {
    pub email: String,
    pub requester_name: String,
    pub requested_role: RequestedRole,
}

/// A user may have at most one pending request. The lookup rejects the common
/// case; the partial unique index on (email, status=PENDING) closes the race.
pub async fn create(
    db: &DatabaseConnection,
    payload: CreateRoleRequestPayload,
) -> Result<RoleRequest> {
    let collection = db.collection::<RoleRequest>(COLLECTION);

    let pending = collection
        .find_one(
            doc! {
                "email": &payload.email,
                "status": RoleRequestStatus::Pending.to_string(),
            },
            None,
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while checking pending requests for {}: {}",
                payload.email,
                err
            );
            Error::UnexpectedError
        })?;

    if pending.is_some() {
        return Err(Error::DuplicatePendingRequest);
    }

    let request = RoleRequest {
        id: Ulid::new().to_string(),
        email: payload.email,
        requester_name: payload.requester_name,
        requested_role: payload.requested_role,
        status: RoleRequestStatus::Pending,
        created_at: Utc::now(),
        decided_at: None,
    };

    collection
        .insert_one(&request, None)
        .await
        .map(|_| request)
        .map_err(|err| {
            if database::is_duplicate_key_error(&err) {
                return Error::DuplicatePendingRequest;
            }

            tracing::error!("Error occurred while creating role request: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_id(db: &DatabaseConnection, id: String) -> Result<Option<RoleRequest>> {
    db.collection::<RoleRequest>(COLLECTION)
        .find_one(doc! { "id": &id }, None)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching role request with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many(
    db: &DatabaseConnection,
    pagination: Pagination,
) -> Result<Paginated<RoleRequest>> {
    let collection = db.collection::<RoleRequest>(COLLECTION);

    let total = collection
        .count_documents(doc! {}, None)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting role requests: {}", err);
            Error::UnexpectedError
        })?;

    let requests = collection
        .find(
            doc! {},
            FindOptions::builder()
                .sort(doc! { "created_at": -1 })
                .skip(pagination.skip())
                .limit(pagination.limit())
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching role requests: {}", err);
            Error::UnexpectedError
        })?
        .try_collect::<Vec<RoleRequest>>()
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while reading role requests cursor: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(
        requests,
        total,
        pagination.page,
        pagination.per_page,
    ))
}

/// Flips a request out of PENDING. The status filter is the guard: a request
/// that was already decided matches nothing and `None` comes back.
pub async fn decide(
    db: &DatabaseConnection,
    id: String,
    status: RoleRequestStatus,
) -> Result<Option<RoleRequest>> {
    db.collection::<RoleRequest>(COLLECTION)
        .find_one_and_update(
            doc! {
                "id": &id,
                "status": RoleRequestStatus::Pending.to_string(),
            },
            doc! { "$set": {
                "status": status.to_string(),
                "decided_at": bson::DateTime::from_chrono(Utc::now()),
            } },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build(),
        )
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while deciding role request {}: {}",
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
    fn status_parses_from_stored_strings() {
        for status in [
            RoleRequestStatus::Pending,
            RoleRequestStatus::Approved,
            RoleRequestStatus::Rejected,
        ] {
            assert_eq!(
                status.to_string().parse::<RoleRequestStatus>(),
                Ok(status.clone())
            );
        }
        assert!("pending".parse::<RoleRequestStatus>().is_err());
    }

    #[test]
    fn requested_role_maps_onto_user_role() {
        assert_eq!(Role::from(RequestedRole::Chef), Role::Chef);
        assert_eq!(Role::from(RequestedRole::Admin), Role::Admin);
    }
}
