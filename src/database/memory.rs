use super::models::{User, UserUpdate};
use super::users::UserRepository;
use super::{UserError, UserResult};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

/// User repository held in process memory, for `STORAGE_BACKEND=memory` and tests
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_id(user: &User, id: &str) -> bool {
    user.id.map_or(false, |oid| oid.to_hex() == id)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, mut user: User) -> UserResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::UserExists(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| matches_id(u, id)).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> UserResult<User> {
        let mut users = self.users.write().await;
        if let Some(email) = &update.email {
            if users.iter().any(|u| &u.email == email && !matches_id(u, id)) {
                return Err(UserError::UserExists("Email is already in use".to_string()));
            }
        }
        let user = users
            .iter_mut()
            .find(|u| matches_id(u, id))
            .ok_or_else(|| UserError::UserNotFound(format!("User {} not found", id)))?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> UserResult<()> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| !matches_id(u, id));
        if users.len() == before {
            return Err(UserError::UserNotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn list_users(&self, skip: u64, limit: i64) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(users
            .iter()
            .skip(skip as usize)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_users(&self) -> UserResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(User::new("a@b.co".into(), "h".into()))
            .await
            .unwrap();
        let err = repo
            .create_user(User::new("a@b.co".into(), "h".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::UserExists(_)));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_update_and_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .create_user(User::new("a@b.co".into(), "h".into()))
            .await
            .unwrap();
        let id = user.id_string();

        assert!(repo.find_by_id("not-an-id").await.unwrap().is_none());
        assert_eq!(repo.find_by_email("a@b.co").await.unwrap().unwrap().id, user.id);

        repo.update_password(&id, "h2".into()).await.unwrap();
        repo.update_last_login(&id).await.unwrap();
        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.password, "h2");
        assert!(stored.last_login.is_some());
        assert!(stored.updated_at.is_some());

        repo.delete_user(&id).await.unwrap();
        let err = repo.delete_user(&id).await.unwrap_err();
        assert!(matches!(err, UserError::UserNotFound(_)));
        let err = repo.update_password(&id, "h3".into()).await.unwrap_err();
        assert!(matches!(err, UserError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            repo.create_user(User::new(format!("u{}@b.co", i), "h".into()))
                .await
                .unwrap();
        }
        let page = repo.list_users(1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].email, "u1@b.co");
    }
}
