//! Bearer-token authentication. Tokens are HS256 JWTs issued by the identity
//! service; this crate only verifies them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: String,
    pub exp: usize,
}

/// Signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Signed-in caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, JsonApiError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            tracing::warn!(err = %e, "token_validation_failed");
            JsonApiError::unauthorized("Invalid or expired token")
        })?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| JsonApiError::unauthorized("Invalid token subject"))?;
        Ok(AuthUser { id, role: data.claims.role })
    }

    /// Mint a token; used by tooling and tests.
    pub fn issue(&self, user_id: Uuid, role: &str, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (chrono::Utc::now().timestamp() + ttl_secs).max(0) as usize;
        let claims = Claims { sub: user_id.to_string(), role: role.to_string(), exp };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| JsonApiError::unauthorized("Missing bearer token"))?;
        state.jwt.verify(token)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(JsonApiError::forbidden("Admin role required"));
        }
        Ok(AdminUser(user))
    }
}
