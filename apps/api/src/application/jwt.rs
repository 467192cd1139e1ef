use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

/// Audience Supabase Auth puts on access tokens for signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

// ============================================================================
// Supabase Access Token Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidCredentials)
    }
}

/// Issue an HS256 access token the way Supabase Auth does. Used by tests and
/// local tooling; production tokens come from Supabase.
pub fn issue(
    user_id: Uuid,
    email: &str,
    secret: &secrecy::SecretString,
    ttl: chrono::Duration,
) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        role: Some(AUTHENTICATED_AUDIENCE.to_string()),
        iat: now,
        exp: now + ttl.num_seconds(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify(token: &str, secret: &secrecy::SecretString) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AppError::InvalidCredentials
    })
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() { None } else { Some(token) }
}
