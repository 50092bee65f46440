use crate::database::models::{User, UserDetail, UserResponse};
use crate::database::{UserError, UserRepository, UserResult};
use bcrypt::{hash, verify};
use std::sync::Arc;

/// Account operations on top of a user repository
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self {
            repository,
            bcrypt_cost,
        }
    }

    /// Hash password using bcrypt, off the async executor
    pub async fn hash_password(&self, password: &str) -> UserResult<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| UserError::Repository(format!("Task join error: {}", e)))?
            .map_err(|e| UserError::Repository(format!("Failed to hash password: {}", e)))
    }

    /// Verify password against hash; malformed hashes never verify
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        match tokio::task::spawn_blocking(move || verify(password, &password_hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                tracing::warn!("Password verification failed: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    pub async fn create_user(&self, email: &str, password: &str) -> UserResult<UserResponse> {
        let password_hash = self.hash_password(password).await?;
        let user = self
            .repository
            .create_user(User::new(email.to_string(), password_hash))
            .await?;
        tracing::info!("Created user {}", user.id_string());
        Ok(UserResponse::from(user))
    }

    pub async fn get_user_by_id(&self, id: &str) -> UserResult<Option<UserDetail>> {
        Ok(self.repository.find_by_id(id).await?.map(UserDetail::from))
    }

    pub async fn get_user_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.repository.find_by_email(email).await
    }

    pub async fn change_password(
        &self,
        id: &str,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<UserResponse> {
        if new_password.is_empty() {
            return Err(UserError::InvalidInput(
                "New password cannot be empty".to_string(),
            ));
        }

        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::UserNotFound(format!("User {} not found", id)))?;

        if !self.verify_password(current_password, &user.password).await {
            return Err(UserError::InvalidInput(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.hash_password(new_password).await?;
        self.repository.update_password(id, password_hash).await?;

        let updated = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::UserNotFound(format!("User {} not found", id)))?;
        tracing::info!("Password changed for user {}", id);
        Ok(UserResponse::from(updated))
    }

    pub async fn delete_user(&self, id: &str) -> UserResult<()> {
        self.repository.delete_user(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn list_users(&self, skip: u64, limit: i64) -> UserResult<Vec<UserResponse>> {
        Ok(self
            .repository
            .list_users(skip, limit)
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect())
    }

    pub async fn count_users(&self) -> UserResult<u64> {
        self.repository.count_users().await
    }

    pub async fn update_last_login(&self, id: &str) -> UserResult<()> {
        self.repository.update_last_login(id).await
    }
}
