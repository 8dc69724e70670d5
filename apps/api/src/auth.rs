//! JWT authentication module.
//!
//! Handles token generation and validation, and the `AuthUser` extractor
//! that guards every authenticated route.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medmart_core::{User, UserRole};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Role at the time the token was issued
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// Tokens handed out by signup, login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    fn generate(&self, user: &User, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate {} token: {}", token_type, e)))
    }

    /// Issues a fresh access/refresh pair for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate(user, ACCESS, self.access_lifetime_secs)?,
            refresh_token: self.generate(user, REFRESH, self.refresh_lifetime_secs)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_lifetime_secs,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != ACCESS {
            return Err(ApiError::unauthenticated("Expected access token"));
        }
        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != REFRESH {
            return Err(ApiError::unauthenticated("Expected refresh token"));
        }
        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The caller behind a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Fails with 403 unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[UserRole]) -> ApiResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Requires role {}", join_roles(roles))))
        }
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        self.require_role(&[UserRole::Admin])
    }

    /// Fails with 403 unless the caller is `owner_id` or an admin.
    pub fn require_owner_or_admin(&self, owner_id: &str) -> ApiResult<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not the owner of this resource"))
        }
    }
}

fn join_roles(roles: &[UserRole]) -> String {
    roles.iter().map(UserRole::as_str).collect::<Vec<_>>().join(" or ")
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("Missing authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthenticated("Expected a bearer token"))?;

        let claims = state.jwt.validate_access_token(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: "user-001".to_string(),
            email: "buyer@clinic.org".to_string(),
            full_name: "Dana Buyer".to_string(),
            role,
            company_name: None,
            has_avatar: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);
        let pair = manager.issue(&user(UserRole::Supplier)).unwrap();

        let claims = manager.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.role, UserRole::Supplier);
        assert_eq!(claims.token_type, "access");
        assert_eq!(pair.expires_in, 3600);

        let claims = manager.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);
        let pair = manager.issue(&user(UserRole::Buyer)).unwrap();

        assert!(manager.validate_refresh_token(&pair.access_token).is_err());
        assert!(manager.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600, 86400);
        let verifier = JwtManager::new("secret-b".to_string(), 3600, 86400);
        let pair = issuer.issue(&user(UserRole::Buyer)).unwrap();

        let err = verifier.validate_access_token(&pair.access_token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthenticated);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_role_guards() {
        let supplier = AuthUser {
            user_id: "s1".to_string(),
            role: UserRole::Supplier,
        };
        assert!(supplier.require_role(&[UserRole::Supplier, UserRole::Admin]).is_ok());
        assert!(supplier.require_admin().is_err());
        assert!(supplier.require_owner_or_admin("s1").is_ok());
        assert!(supplier.require_owner_or_admin("s2").is_err());

        let admin = AuthUser {
            user_id: "a1".to_string(),
            role: UserRole::Admin,
        };
        assert!(admin.require_owner_or_admin("s2").is_ok());
    }
}
