use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // always "admin" - there is a single moderator credential
    pub exp: i64,    // expiration timestamp
    pub iat: i64,    // issued at
}

/// Verifies the admin credential and issues/validates session tokens.
/// The password is only ever held as a bcrypt hash.
pub struct AuthService {
    jwt_secret: String,
    admin_password_hash: String,
}

impl AuthService {
    pub fn new(jwt_secret: String, admin_password_hash: String) -> Self {
        Self {
            jwt_secret,
            admin_password_hash,
        }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password, 10)
    }

    /// Verify a password against the configured admin hash. An unset hash
    /// fails verification, so admin routes stay closed until configured.
    pub fn verify_admin_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.admin_password_hash).unwrap_or(false)
    }

    /// Generate a JWT session token for the admin
    pub fn generate_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(7);

        let claims = Claims {
            sub: "admin".to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
    }

    /// Validate a JWT token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Marker extracted from requests carrying a valid admin token. Handlers for
/// admin-only routes take this as a parameter; extraction failure answers
/// with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AdminAuth;

impl FromRequest for AdminAuth {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(admin_from_request(req))
    }
}

fn admin_from_request(req: &HttpRequest) -> Result<AdminAuth, ApiError> {
    let auth_service = req
        .app_data::<web::Data<Arc<AuthService>>>()
        .ok_or_else(|| ApiError::Unauthorized("Auth service unavailable".to_string()))?;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))?;

    auth_service
        .validate_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(AdminAuth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_auth_service() -> AuthService {
        let hash = AuthService::hash_password("my_secure_password").unwrap();
        AuthService::new("test_secret".to_string(), hash)
    }

    #[test]
    fn test_password_verification() {
        let auth = create_test_auth_service();

        assert!(auth.verify_admin_password("my_secure_password"));
        assert!(!auth.verify_admin_password("wrong_password"));
    }

    #[test]
    fn test_empty_hash_never_verifies() {
        let auth = AuthService::new("test_secret".to_string(), String::new());
        assert!(!auth.verify_admin_password(""));
        assert!(!auth.verify_admin_password("anything"));
    }

    #[test]
    fn test_jwt_token_roundtrip() {
        let auth = create_test_auth_service();

        let token = auth.generate_token().unwrap();
        let claims = auth.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = create_test_auth_service();

        let now = Utc::now();
        let claims = Claims {
            sub: "admin".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret".as_bytes()),
        )
        .unwrap();

        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let auth = create_test_auth_service();
        let other = AuthService::new("other_secret".to_string(), String::new());

        let token = other.generate_token().unwrap();
        assert!(auth.validate_token(&token).is_err());
    }
}
