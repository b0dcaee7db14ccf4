//! Authentication for the Almanac API.
//!
//! Bearer tokens are HS256 JWTs carrying the user id; passwords are stored
//! as bcrypt hashes. Token verification for protected routes happens in the
//! [`AuthLayer`] middleware, which inserts an [`AuthContext`] extension.

mod middleware;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AuthError;

pub use middleware::{AuthLayer, AuthMiddleware};

/// Authentication context from a validated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user id.
    pub user_id: String,
    /// Email recorded in the token.
    pub email: String,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id).
    pub sub: String,
    /// Email at issuance time.
    pub email: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Issues and validates credentials.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
    token_expiry_days: i64,
}

impl Authenticator {
    /// Create an authenticator from config.
    ///
    /// The signing secret comes from `auth.jwt_secret`, falling back to the
    /// `ALMANAC_JWT_SECRET` environment variable. A missing secret is an
    /// unrecoverable startup failure.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = if !config.jwt_secret.is_empty() {
            config.jwt_secret.clone()
        } else {
            std::env::var("ALMANAC_JWT_SECRET").map_err(|_| AuthError::MissingSecret)?
        };

        Ok(Self {
            secret,
            token_expiry_days: config.token_expiry_days,
        })
    }

    /// Generate a bearer token for a user.
    pub fn generate_token(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.token_expiry_days);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Validate a bearer token and return its context.
    pub fn validate_token(&self, token: &str) -> Result<AuthContext, AuthError> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthContext {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }
}

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against its bcrypt hash on the blocking pool.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}
