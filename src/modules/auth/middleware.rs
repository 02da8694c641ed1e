use super::service::{self, Claims};
use crate::modules::user::{self, repository::User};
use crate::types::Context;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::RequestPartsExt;
use axum::{async_trait, Json};
use axum::{extract::Extension, http, http::request::Parts, response::Response};
use serde_json::json;
use std::sync::Arc;

enum Error {
    InvalidToken,
}

fn get_token_from_header(header: String) -> Result<String, Error> {
    header
        .split(' ')
        .nth(1)
        .map(|token| token.to_string())
        .ok_or(Error::InvalidToken)
}

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid identity token" })),
    )
}

async fn get_claims_from_request(ctx: Arc<Context>, parts: &mut Parts) -> Result<Claims, Response> {
    let headers = parts.extract::<HeaderMap>().await.unwrap();

    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(unauthorized().into_response())?;

    let token =
        get_token_from_header(auth_header.to_string()).map_err(|_| unauthorized().into_response())?;

    service::verify_id_token(ctx, token)
        .await
        .map_err(|_| unauthorized().into_response())
}

async fn get_user_from_request(ctx: Arc<Context>, parts: &mut Parts) -> Result<User, Response> {
    let claims = get_claims_from_request(ctx.clone(), parts).await?;

    user::repository::find_by_email(&ctx.db_conn, claims.email)
        .await
        .map_err(|_| unauthorized().into_response())?
        .ok_or(unauthorized().into_response())
}

/// Verified identity only; the account may not exist yet (sign-in upsert).
#[derive(Clone)]
pub struct Auth {
    pub claims: Claims,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();
        get_claims_from_request(ctx, parts)
            .await
            .map(|claims| Self { claims })
    }
}

#[derive(Clone)]
pub struct UserAuth {
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();
        get_user_from_request(ctx, parts)
            .await
            .map(|user| Self { user })
    }
}

#[derive(Clone)]
pub struct AdminAuth {
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();

        let user = get_user_from_request(ctx, parts).await?;

        if !user::repository::is_admin(&user) {
            return Err(
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            );
        }

        Ok(Self { user })
    }
}

#[derive(Clone)]
pub struct ChefAuth {
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ChefAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();

        let user = get_user_from_request(ctx, parts).await?;

        if !user::repository::is_chef(&user) {
            return Err(
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            );
        }

        // Accounts flagged as fraudulent keep their role but lose chef access.
        if user.status == user::repository::AccountStatus::Fraud {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Account is restricted" })),
            )
                .into_response());
        }

        Ok(Self { user })
    }
}
