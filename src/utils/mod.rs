use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims the console reads from a JWT access token.
///
/// The signature is the backend's business; the client only looks at the
/// expiry to decide when to renew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Reads the claims of a JWT without verifying it. Opaque tokens give `None`.
pub fn peek_claims(token: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    peek_claims(token).and_then(|claims| DateTime::from_timestamp(claims.exp, 0))
}

/// Whether `token` is a JWT that expires within `leeway` of `now`.
/// Opaque tokens never need proactive renewal.
pub fn needs_renewal(token: &str, leeway: Duration, now: DateTime<Utc>) -> bool {
    let Some(expiry) = token_expiry(token) else {
        return false;
    };
    let leeway = chrono::Duration::from_std(leeway).unwrap_or(chrono::Duration::MAX);
    now.checked_add_signed(leeway).is_none_or(|deadline| expiry <= deadline)
}
