use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::service::roles::ClaimSet;

/// Decodes and verifies an HS256 token, returning its claims as a flat
/// claim set. Any signature, shape or expiry problem is a single opaque
/// error; callers map it to 401.
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &[u8],
) -> Result<ClaimSet, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoded = decode::<Value>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &validation,
    )?;

    let claims = match decoded.claims.as_object() {
        Some(map) => ClaimSet::from_json(map),
        None => ClaimSet::default(),
    };
    Ok(claims)
}
