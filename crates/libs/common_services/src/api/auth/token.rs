use crate::api::auth::error::AuthError;
use crate::api::auth::interfaces::AuthClaims;
use crate::database::app_user::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Creates a new HS256 access token for a given user ID and role.
///
/// # Errors
///
/// * `AuthError::Internal` if token encoding fails.
pub fn create_access_token(
    jwt_secret: &str,
    user_id: i32,
    role: UserRole,
    expiry_minutes: i64,
) -> Result<String, AuthError> {
    let exp = (Utc::now() + Duration::minutes(expiry_minutes)).timestamp();
    let claims = AuthClaims {
        sub: user_id,
        exp,
        role,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )?)
}

/// Checks signature and expiry of an access token and returns its claims.
///
/// # Errors
///
/// * `AuthError::InvalidToken` for malformed, forged or expired tokens.
pub fn decode_access_token(jwt_secret: &str, token: &str) -> Result<AuthClaims, AuthError> {
    decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}
