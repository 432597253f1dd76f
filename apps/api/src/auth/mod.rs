pub mod password;

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

/// Token lifetime. The payload carries username and role, nothing else.
const TOKEN_TTL_SECS: u64 = 60 * 60 * 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub exp: u64,
}

/// Mints a signed HS256 token for the given user identity.
pub fn mint_token(username: &str, is_admin: bool, secret: &str) -> Result<String, AppError> {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(e.into()))?
        .as_secs()
        + TOKEN_TTL_SECS;

    let claims = Claims {
        username: username.to_string(),
        is_admin,
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies a token's signature and expiry, returning its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Handlers that accept anonymous callers simply don't take one.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Admin-only routes. Non-admins get the same 401 an anonymous caller
    /// would, never a hint the resource exists.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Routes a user may hit for their own account, or an admin for anyone.
    pub fn require_admin_or_self(&self, username: &str) -> Result<(), AppError> {
        if self.is_admin || self.username == username {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = verify_token(token.trim(), &state.config.jwt_secret)?;
        Ok(AuthUser {
            username: claims.username,
            is_admin: claims.is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let token = mint_token("u1", false, "test-secret").unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.username, "u1");
        assert!(!claims.is_admin);
    }

    #[test]
    fn token_preserves_admin_flag() {
        let token = mint_token("admin", true, "test-secret").unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert!(claims.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_token("u1", false, "test-secret").unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-jwt", "test-secret").is_err());
    }
}
