use crate::types::{CachedIdentityKeys, Context, IdentityKey, IdentityKeySet};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;

pub enum Error {
    InvalidToken,
    UnexpectedError,
}

/// Claims extracted from a verified provider-issued ID token. Tokens without
/// an email claim are rejected outright since every record is keyed by email.
#[derive(Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
}

async fn fetch_identity_keys(ctx: Arc<Context>) -> Result<IdentityKeySet, Error> {
    let res = reqwest::Client::new()
        .get(ctx.identity.certs_endpoint.clone())
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch identity provider keys: {}", err);
            Error::UnexpectedError
        })?;

    res.json::<IdentityKeySet>().await.map_err(|err| {
        tracing::error!("Failed to parse identity provider key set: {}", err);
        Error::UnexpectedError
    })
}

async fn get_identity_key(ctx: Arc<Context>, kid: &str) -> Result<IdentityKey, Error> {
    let mut cache = ctx.identity.keys.lock().await;

    let usable = match cache.as_ref() {
        Some(cached) => cached.expires_at > Utc::now() && cached.keys.contains_key(kid),
        None => false,
    };

    if !usable {
        let key_set = fetch_identity_keys(ctx.clone()).await?;

        // The provider rotates keys; refetch whenever an unknown kid shows up.
        *cache = Some(CachedIdentityKeys {
            keys: key_set
                .keys
                .into_iter()
                .map(|key| (key.kid.clone(), key))
                .collect(),
            expires_at: Utc::now() + Duration::hours(1),
        });
    }

    cache
        .as_ref()
        .and_then(|cached| cached.keys.get(kid))
        .cloned()
        .ok_or(Error::InvalidToken)
}

pub async fn verify_id_token(ctx: Arc<Context>, token: String) -> Result<Claims, Error> {
    let header = jsonwebtoken::decode_header(&token).map_err(|_| Error::InvalidToken)?;
    let kid = header.kid.ok_or(Error::InvalidToken)?;

    let key = get_identity_key(ctx.clone(), &kid).await?;
    let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|err| {
        tracing::error!("Identity provider published an invalid key: {}", err);
        Error::UnexpectedError
    })?;

    let validation = token_validation(&ctx.identity.project_id);

    jsonwebtoken::decode::<Claims>(&token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            tracing::debug!("Failed to verify id token: {}", err);
            Error::InvalidToken
        })
}

fn token_validation(project_id: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[project_id]);
    validation.set_issuer(&[format!("https://securetoken.google.com/{}", project_id)]);
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_pins_audience_and_issuer_to_the_project() {
        let validation = token_validation("bazaar-test");

        let audiences = validation.aud.expect("audience should be set");
        assert!(audiences.contains("bazaar-test"));

        let issuers = validation.iss.expect("issuer should be set");
        assert!(issuers.contains("https://securetoken.google.com/bazaar-test"));
    }

    #[test]
    fn claims_require_an_email() {
        let missing_email = serde_json::json!({ "sub": "abc123" });
        assert!(serde_json::from_value::<Claims>(missing_email).is_err());

        let with_email = serde_json::json!({ "sub": "abc123", "email": "chef@example.com" });
        let claims = serde_json::from_value::<Claims>(with_email).unwrap();
        assert_eq!(claims.email, "chef@example.com");
        assert!(claims.name.is_none());
    }
}
