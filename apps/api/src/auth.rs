//! Admin authentication.
//!
//! One configured administrator logs in with a password (argon2 PHC hash) and
//! receives a short-lived HS256 token. Every `/api/admin/sales` route sits
//! behind [`require_admin`].
//!
//! ```text
//! POST /api/admin/login {username, password}
//!      │  argon2 verify (blocking pool)
//!      ▼
//! {token, token_type: "Bearer", expires_in}
//!      │
//!      ▼
//! GET /api/admin/sales   Authorization: Bearer <token>
//!      │  require_admin → JwtManager::validate_token
//!      ▼
//! handler
//! ```

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate an access token for `subject`.
    pub fn generate_token(&self, subject: &str) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token. Signature and expiry are checked.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

/// Extract the bearer token from an Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with argon2id and a random salt (PHC string).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a PHC hash.
pub fn verify_password(password: &str, password_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// Admin Login
// =============================================================================

/// Credentials posted to the login route.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token handed back on successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// The configured administrator plus the token manager.
pub struct AdminAuth {
    username: String,
    password_hash: String,
    jwt: JwtManager,
}

impl AdminAuth {
    /// Fails if `password_hash` is not a PHC string.
    pub fn new(username: String, password_hash: String, jwt: JwtManager) -> ApiResult<Self> {
        PasswordHash::new(&password_hash)
            .map_err(|e| ApiError::internal(format!("Invalid admin password hash: {}", e)))?;

        Ok(AdminAuth {
            username,
            password_hash,
            jwt,
        })
    }

    /// Checks the credentials and issues a token.
    ///
    /// The hash is verified even for an unknown username, so both failures
    /// take the same time and return the same error.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let hash = self.password_hash.clone();
        let LoginRequest { username, password } = request;

        let password_ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("Password check aborted: {}", e)))??;

        if !password_ok || username != self.username {
            warn!(username = %username, "Admin login rejected");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }

        let token = self.jwt.generate_token(&self.username)?;
        info!(username = %self.username, "Admin logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.lifetime_secs(),
        })
    }

    /// Validates a bearer token issued by [`AdminAuth::login`].
    pub fn authorize(&self, headers: &HeaderMap) -> ApiResult<Claims> {
        let token = extract_bearer_token(headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = self.jwt.validate_token(token)?;
        if claims.sub != self.username {
            return Err(ApiError::unauthorized("Invalid or expired token"));
        }

        Ok(claims)
    }
}

/// Router layer guarding the admin routes.
pub async fn require_admin(
    State(auth): State<Arc<AdminAuth>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = auth.authorize(request.headers())?;
    debug!(sub = %claims.sub, jti = %claims.jti, "Admin request authorized");
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin(password: &str) -> AdminAuth {
        let hash = hash_password(password).unwrap();
        AdminAuth::new(
            "admin".to_string(),
            hash,
            JwtManager::new("test-secret".to_string(), 3600),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = JwtManager::new("secret".to_string(), 60);
        let token = jwt.generate_token("admin").unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejected_with_other_secret_or_expired() {
        let token = JwtManager::new("secret".to_string(), 60)
            .generate_token("admin")
            .unwrap();
        let err = JwtManager::new("other".to_string(), 60)
            .validate_token(&token)
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);

        // Well past the default 60 s leeway
        let expired = JwtManager::new("secret".to_string(), -3600)
            .generate_token("admin")
            .unwrap();
        assert!(JwtManager::new("secret".to_string(), 60)
            .validate_token(&expired)
            .is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWRtaW4="));
        assert_eq!(extract_bearer_token(&basic), None);
    }

    #[test]
    fn test_rejects_malformed_hash() {
        let result = AdminAuth::new(
            "admin".to_string(),
            "plain-text".to_string(),
            JwtManager::new("s".to_string(), 60),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_login_and_authorize() {
        let auth = admin("s3nha");

        let response = auth
            .login(LoginRequest {
                username: "admin".to_string(),
                password: "s3nha".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);

        let claims = auth.authorize(&bearer(&response.token)).unwrap();
        assert_eq!(claims.sub, "admin");
        assert!(auth.authorize(&HeaderMap::new()).is_err());
        assert!(auth.authorize(&bearer("garbage")).is_err());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let auth = admin("s3nha");

        for (username, password) in [("admin", "wrong"), ("root", "s3nha")] {
            let err = auth
                .login(LoginRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
        }
    }
}
