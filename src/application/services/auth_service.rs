//! Authentication Service
//!
//! Registration, login, and token refresh. Passwords are hashed with
//! Argon2id; login failures are indistinguishable between unknown user and
//! wrong password.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use uuid::Uuid;

use super::token_service::TokenService;
use crate::domain::{Claims, TokenKind, User, UserRepository};
use crate::shared::error::AppError;

/// Token pair issued on login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

pub struct AuthService<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    tokens: Arc<TokenService>,
}

impl<U> AuthService<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user. Returns the user id.
    pub async fn register(&self, username: &str, password: &str) -> Result<Uuid, AppError> {
        let username = username.trim();
        validate_credentials(username, password)?;

        // Early availability probe, before the expensive hash.
        if self.users.exists_by_username(username).await? {
            return Err(AppError::UsernameConflict);
        }

        let password_hash = hash_password(password)?;
        let user = User::new(username.to_string(), password_hash);

        self.users.create(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user.id)
    }

    /// Authenticate and mint an access/refresh pair under a new session id.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthTokens, AppError> {
        let username = username.trim();

        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                tracing::warn!(username, "login failed: user not found");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(username, "login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let session_id = Uuid::new_v4().to_string();

        let access = self
            .tokens
            .sign(TokenKind::Access, user.id, &session_id, None, None)?;
        let refresh = self
            .tokens
            .sign(TokenKind::Refresh, user.id, &session_id, None, None)?;

        tracing::info!(user_id = %user.id, session_id = %session_id, "user logged in");

        Ok(AuthTokens {
            access_token: access,
            refresh_token: refresh,
            expires_in: self.tokens.access_ttl_secs(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Exchange a refresh token for a fresh pair.
    pub fn refresh_token(&self, refresh: &str) -> Result<AuthTokens, AppError> {
        let (access, refresh) = self.tokens.refresh_pair(refresh)?;

        Ok(AuthTokens {
            access_token: access,
            refresh_token: refresh,
            expires_in: self.tokens.access_ttl_secs(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Validate an access token.
    pub fn validate_access(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.validate_access(token)
    }
}

/// Hash a password with Argon2id.
fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against its hash in constant time.
fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.chars().count() < 3 {
        return Err(AppError::InvalidArgument(
            "username must be at least 3 characters".into(),
        ));
    }
    if username.chars().count() > 32 {
        return Err(AppError::InvalidArgument(
            "username must be at most 32 characters".into(),
        ));
    }
    if password.chars().count() < 8 {
        return Err(AppError::InvalidArgument(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::MemoryStore;
    use crate::config::AuthSettings;

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            &AuthSettings {
                secret: "0123456789abcdef0123456789abcdef".into(),
                key_id: "v1".into(),
                access_token_expiry_minutes: 60,
                refresh_token_expiry_days: 7,
            },
            "local",
        ))
    }

    fn service() -> AuthService<MemoryStore> {
        AuthService::new(Arc::new(MemoryStore::default()), token_service())
    }

    #[tokio::test]
    async fn register_trims_and_persists() {
        let svc = service();

        let user_id = svc.register("  alice  ", "hunter22pass").await.unwrap();
        let user = svc.users.find_by_id(user_id).await.unwrap().unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "hunter22pass");
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let svc = service();

        assert!(matches!(
            svc.register("ab", "hunter22pass").await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            svc.register(&"x".repeat(33), "hunter22pass").await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            svc.register("alice", "short").await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn register_conflicts_case_insensitively() {
        let svc = service();

        svc.register("alice", "hunter22pass").await.unwrap();
        assert!(matches!(
            svc.register("ALICE", "hunter22pass").await,
            Err(AppError::UsernameConflict)
        ));
    }

    #[tokio::test]
    async fn login_issues_validating_pair() {
        let svc = service();
        let user_id = svc.register("alice", "hunter22pass").await.unwrap();

        let tokens = svc.login("alice", "hunter22pass").await.unwrap();
        assert_eq!(tokens.token_type, "Bearer");

        let claims = svc.validate_access(&tokens.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);

        // Access and refresh share the session.
        let refresh_claims = svc.tokens.validate(&tokens.refresh_token).unwrap();
        assert_eq!(refresh_claims.sid, claims.sid);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let svc = service();
        svc.register("alice", "hunter22pass").await.unwrap();

        let unknown = svc.login("nobody", "hunter22pass").await.unwrap_err();
        let wrong = svc.login("alice", "wrong-password").await.unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_round_trip() {
        let svc = service();
        svc.register("alice", "hunter22pass").await.unwrap();
        let tokens = svc.login("alice", "hunter22pass").await.unwrap();

        let old_refresh = svc.tokens.validate(&tokens.refresh_token).unwrap();
        let renewed = svc.refresh_token(&tokens.refresh_token).unwrap();

        let access = svc.validate_access(&renewed.access_token).unwrap();
        let refresh = svc.tokens.validate(&renewed.refresh_token).unwrap();

        assert_eq!(access.sid, old_refresh.sid);
        assert_eq!(refresh.orig_iat, old_refresh.orig_iat);
        assert_eq!(refresh.rat.as_deref(), Some(old_refresh.jti.as_str()));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let svc = service();
        svc.register("alice", "hunter22pass").await.unwrap();
        let tokens = svc.login("alice", "hunter22pass").await.unwrap();

        assert!(matches!(
            svc.refresh_token(&tokens.access_token),
            Err(AppError::TokenInvalid(_))
        ));
    }
}
