// JWT token generation and validation service

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{error::AuthError, models::Role};
use crate::config::Config;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id, as a string
    pub sub: String,
    /// Random id so two refresh tokens minted in the same second still differ
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token service for JWT operations
///
/// Holds the signing keys derived from the configured secret. Stateless apart
/// from that, so one instance is shared by every request.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_token_ttl: Duration, refresh_token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl,
            refresh_token_ttl,
        }
    }

    /// Access tokens live `ACCESS_TOKEN_TTL_MIN` minutes, refresh tokens `REFRESH_TOKEN_TTL_HOUR` hours
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::hours(config.refresh_token_ttl_hours),
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Generate a signed access token for the given identity
    pub fn issue_access_token(&self, user_id: i32, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: expiry(now, self.access_token_ttl)?.timestamp(),
        };
        self.sign(&claims)
    }

    /// Generate a signed refresh token; also returns its absolute expiry
    pub fn issue_refresh_token(&self, user_id: i32) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = expiry(now, self.refresh_token_ttl)?;
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, expires_at))
    }

    /// Validate an access token and return its claims
    pub fn parse_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token)
    }

    /// Validate a refresh token's signature and expiry and return its claims
    pub fn parse_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is exact: a token is dead the second its exp passes
        validation.leeway = 0;

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::TokenGenerationError("token lifetime out of range".to_string()))
}
