//! Bearer-token identity extraction
//!
//! The chat endpoint is usable anonymously; a missing or invalid token
//! degrades to an unauthenticated query instead of rejecting the request.
//! Identity-gated behavior (order lookups, cart confirmation) is enforced
//! downstream by the agents and the conversation tracker.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Identity;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}

/// Decodes the `Authorization: Bearer` header into an identity, if present
/// and valid.
pub fn identity_from_headers(headers: &HeaderMap, jwt_secret: &str) -> Option<Identity> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(Identity {
            customer_id: data.claims.user_id,
            role: data.claims.role.unwrap_or_else(|| "customer".to_string()),
        }),
        Err(err) => {
            warn!("failed to decode bearer token: {}", err);
            None
        }
    }
}
