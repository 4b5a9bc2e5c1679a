// Authentication service - business logic layer

use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    models::{LoginTokens, NewUser, Role, User},
    password::PasswordService,
    repository::UserStore,
    token::TokenService,
};

/// Authentication service coordinating registration, login and token refresh
///
/// Each user holds at most one active refresh token. Login overwrites it, which
/// revokes whatever refresh token that user held before.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Register a new user. No tokens are issued here.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::ValidationError(
                "username and password are required".to_string(),
            ));
        }

        if self.store.find_by_username(username).await?.is_some() {
            tracing::debug!("Registration rejected, username taken: {}", username);
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = PasswordService::hash_password(password)?;

        // the store re-checks uniqueness, a concurrent register loses here
        let user = self
            .store
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!("Registered user id={} role={}", user.id, user.role);
        Ok(user)
    }

    /// Verify credentials and issue an access/refresh token pair
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginTokens, AuthError> {
        let Some(mut user) = self.store.find_by_username(username.trim()).await? else {
            PasswordService::verify_dummy(password);
            tracing::warn!("Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify_password(password, &user.password_hash)? {
            tracing::warn!("Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access_token(user.id, user.role)?;
        let (refresh_token, refresh_expires_at) = self.tokens.issue_refresh_token(user.id)?;

        // Must be stored before responding so a racing refresh sees the new token
        user.refresh_token = Some(refresh_token.clone());
        self.store.update(&user).await?;

        tracing::info!("User id={} logged in", user.id);
        Ok(LoginTokens {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Mint a new access token from the user's current refresh token
    ///
    /// The refresh token itself is not rotated and stays valid until it expires
    /// or the user logs in again.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let Some(user) = self.store.find_by_refresh_token(refresh_token).await? else {
            tracing::warn!("Refresh rejected: token not on record");
            return Err(AuthError::InvalidRefreshToken);
        };

        let claims = self.tokens.parse_refresh_token(refresh_token).map_err(|e| {
            tracing::warn!("Refresh rejected for user id={}: {}", user.id, e);
            AuthError::ExpiredRefreshToken
        })?;

        if claims.sub != user.id.to_string() {
            tracing::warn!("Refresh rejected: subject does not match user id={}", user.id);
            return Err(AuthError::InvalidRefreshToken);
        }

        let access_token = self.tokens.issue_access_token(user.id, user.role)?;
        tracing::debug!("Issued refreshed access token for user id={}", user.id);
        Ok(access_token)
    }

    /// Look up a user by id
    pub async fn get_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
