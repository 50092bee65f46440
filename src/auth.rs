use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::database::models::{TokenResponse, UserDetail, UserResponse};
use crate::database::UserError;
use crate::services::UserService;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub email: String,
    pub iat: usize, // Issued at
    pub exp: usize, // Expiration time
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to create token: {0}")]
    TokenCreation(String),
    #[error(transparent)]
    User(#[from] UserError),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_expires_minutes: i64,
}

impl From<&Settings> for AuthConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            jwt_algorithm: settings.jwt_algorithm,
            jwt_expires_minutes: settings.jwt_expires_minutes,
        }
    }
}

/// Normalise an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    config: std::sync::Arc<AuthConfig>,
    users: UserService,
}

impl AuthService {
    pub fn new(config: AuthConfig, users: UserService) -> Self {
        Self {
            config: std::sync::Arc::new(config),
            users,
        }
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// Generate JWT token for user
    pub fn create_access_token(&self, user_id: &str, email: &str) -> AuthResult<String> {
        let now = Utc::now();
        let exp = Duration::try_minutes(self.config.jwt_expires_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::TokenCreation(format!(
                    "token lifetime of {} minutes is out of range",
                    self.config.jwt_expires_minutes
                ))
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp().max(0) as usize,
            exp: exp.timestamp().max(0) as usize,
        };

        let header = Header::new(self.config.jwt_algorithm);
        let key = EncodingKey::from_secret(self.config.jwt_secret.as_ref());

        encode(&header, &claims, &key).map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Verify JWT token and extract claims
    pub fn decode_access_token(&self, token: &str) -> AuthResult<Claims> {
        let key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let mut validation = Validation::new(self.config.jwt_algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    pub async fn register(&self, email: &str, password: &str) -> AuthResult<UserResponse> {
        let email = normalize_email(email);
        if !EMAIL.is_match(&email) {
            return Err(UserError::InvalidInput("Invalid email address".to_string()).into());
        }
        if password.is_empty() {
            return Err(UserError::InvalidInput("Password cannot be empty".to_string()).into());
        }

        Ok(self.users.create_user(&email, password).await?)
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenResponse> {
        let email = normalize_email(email);
        let Some(user) = self.users.get_user_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.users.verify_password(password, &user.password).await {
            return Err(AuthError::InvalidCredentials);
        }

        let user_id = user.id_string();
        if let Err(e) = self.users.update_last_login(&user_id).await {
            tracing::warn!("Failed to update last login for {}: {}", user_id, e);
        }

        let token = self.create_access_token(&user_id, &user.email)?;
        tracing::info!("User {} logged in", user_id);
        Ok(TokenResponse::bearer(token))
    }

    /// Get user by JWT token
    pub async fn authenticate(&self, token: &str) -> AuthResult<UserDetail> {
        let claims = self.decode_access_token(token)?;
        self.users
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| UserError::UserNotFound("User not found".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryUserRepository;
    use std::sync::Arc;

    fn auth_with(secret: &str, minutes: i64) -> AuthService {
        AuthService::new(
            AuthConfig {
                jwt_secret: secret.to_string(),
                jwt_algorithm: Algorithm::HS256,
                jwt_expires_minutes: minutes,
            },
            UserService::new(Arc::new(InMemoryUserRepository::new()), 4),
        )
    }

    #[test]
    fn test_token_round_trip() {
        let auth = auth_with("secret", 60);
        let token = auth.create_access_token("user-1", "a@b.co").unwrap();
        let claims = auth.decode_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@b.co");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let auth = auth_with("secret", -5);
        let token = auth.create_access_token("user-1", "a@b.co").unwrap();
        assert!(matches!(
            auth.decode_access_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_out_of_range_lifetime_fails_without_panicking() {
        let auth = auth_with("secret", i64::MAX);
        let err = auth.create_access_token("user-1", "a@b.co").unwrap_err();
        assert!(matches!(err, AuthError::TokenCreation(_)));
    }

    #[test]
    fn test_wrong_secret_and_garbage() {
        let token = auth_with("one", 60)
            .create_access_token("user-1", "a@b.co")
            .unwrap();
        let other = auth_with("two", 60);
        assert!(matches!(
            other.decode_access_token(&token),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            other.decode_access_token("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_register_login_authenticate() {
        let auth = auth_with("secret", 60);
        let user = auth.register("  Alice@Example.COM ", "pw").await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        let err = auth.register("alice@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::User(UserError::UserExists(_))));

        let err = auth.login("alice@example.com", "bad").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let err = auth.login("nobody@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let token = auth.login("ALICE@example.com", "pw").await.unwrap();
        assert_eq!(token.token_type, "bearer");

        let current = auth.authenticate(&token.access_token).await.unwrap();
        assert_eq!(current.user.id, user.id);
        assert!(current.last_login.is_some());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = auth_with("secret", 60);
        let err = auth.register("not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::User(UserError::InvalidInput(_))));
        let err = auth.register("a@b.co", "").await.unwrap_err();
        assert!(matches!(err, AuthError::User(UserError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_authenticate() {
        let auth = auth_with("secret", 60);
        let user = auth.register("a@b.co", "pw").await.unwrap();
        let token = auth.login("a@b.co", "pw").await.unwrap();
        auth.users().delete_user(&user.id).await.unwrap();

        let err = auth.authenticate(&token.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::User(UserError::UserNotFound(_))));
    }
}
