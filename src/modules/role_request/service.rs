use super::repository::{self, RequestedRole, RoleRequest, RoleRequestStatus};
use crate::modules::user::{self, repository::Role};
use crate::types::Context;
use serde::Deserialize;
use std::sync::Arc;
use ulid::Ulid;

pub enum Error {
    RequestNotFound,
    AlreadyDecided,
    UnexpectedError,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub enum Decision {
    #[serde(rename = "approve")]
    Approve,
    #[serde(rename = "reject")]
    Reject,
}

pub struct DecideRoleRequestPayload {
    pub request_id: String,
    pub decision: Decision,
}

/// What approving a request grants: the new role, and a freshly allocated chef
/// identifier when promoting to chef. Admins only get the role.
fn promotion_for(requested_role: RequestedRole) -> (Role, Option<String>) {
    match requested_role {
        RequestedRole::Chef => (Role::Chef, Some(Ulid::new().to_string())),
        RequestedRole::Admin => (Role::Admin, None),
    }
}

/// Approval updates the request and then the requester's user record. The two
/// writes are sequential, not atomic: the PENDING filter on the request update
/// means a concurrent decision loses cleanly rather than applying twice.
pub async fn decide_role_request(
    ctx: Arc<Context>,
    payload: DecideRoleRequestPayload,
) -> Result<RoleRequest, Error> {
    let request = repository::find_by_id(&ctx.db_conn, payload.request_id.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::RequestNotFound)?;

    if request.status != RoleRequestStatus::Pending {
        return Err(Error::AlreadyDecided);
    }

    let status = match payload.decision {
        Decision::Approve => RoleRequestStatus::Approved,
        Decision::Reject => RoleRequestStatus::Rejected,
    };

    let decided = repository::decide(&ctx.db_conn, payload.request_id, status)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::AlreadyDecided)?;

    if payload.decision == Decision::Reject {
        return Ok(decided);
    }

    let (role, chef_id) = promotion_for(decided.requested_role.clone());

    user::repository::set_role(
        &ctx.db_conn,
        user::repository::SetRolePayload {
            email: decided.email.clone(),
            role,
            chef_id,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    .ok_or_else(|| {
        tracing::error!(
            "Approved role request {} but requester {} no longer exists",
            decided.id,
            decided.email
        );
        Error::UnexpectedError
    })?;

    Ok(decided)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promoting_to_chef_allocates_a_chef_id() {
        let (role, chef_id) = promotion_for(RequestedRole::Chef);
        assert_eq!(role, Role::Chef);
        let chef_id = chef_id.expect("chef promotion should allocate a chef id");
        assert!(!chef_id.is_empty());
    }

    #[test]
    fn promoting_to_admin_grants_only_the_role() {
        let (role, chef_id) = promotion_for(RequestedRole::Admin);
        assert_eq!(role, Role::Admin);
        assert!(chef_id.is_none());
    }

    #[test]
    fn chef_ids_are_unique_per_promotion() {
        let (_, first) = promotion_for(RequestedRole::Chef);
        let (_, second) = promotion_for(RequestedRole::Chef);
        assert_ne!(first, second);
    }

    #[test]
    fn decision_deserializes_from_lowercase() {
        let decision: Decision = serde_json::from_str("\"approve\"").unwrap();
        assert_eq!(decision, Decision::Approve);
        let decision: Decision = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(decision, Decision::Reject);
        assert!(serde_json::from_str::<Decision>("\"APPROVE\"").is_err());
    }
}
