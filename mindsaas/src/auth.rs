//! Bearer-token authentication for the user-facing endpoints.
//!
//! Tokens are HS256 JWTs whose `sub` claim carries the owner id, verified
//! against the configured `secret_key`. The intake front end obtains its
//! token from the identity provider; this service only verifies.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{AppState, errors::Error, types::OwnerId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: OwnerId,
    pub exp: i64,
}

/// The authenticated caller, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: OwnerId,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Error::Unauthenticated { message: None })?;

        let secret = state.config.secret_key.as_deref().ok_or(Error::Unauthenticated {
            message: Some("Authentication is not configured".to_string()),
        })?;

        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| Error::Unauthenticated {
            message: Some("Invalid token".to_string()),
        })?;

        Ok(CurrentUser { id: data.claims.sub })
    }
}
