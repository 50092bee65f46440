use super::models::{User, UserUpdate};
use super::{UserError, UserResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    error::{ErrorKind, WriteFailure},
    options::ReturnDocument,
    Collection,
};

const DUPLICATE_KEY: i32 = 11000;

/// Persistence for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email is `UserExists`
    async fn create_user(&self, user: User) -> UserResult<User>;

    /// Malformed ids simply find nothing
    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn update_user(&self, id: &str, update: UserUpdate) -> UserResult<User>;

    async fn delete_user(&self, id: &str) -> UserResult<()>;

    async fn list_users(&self, skip: u64, limit: i64) -> UserResult<Vec<User>>;

    async fn count_users(&self) -> UserResult<u64>;

    async fn update_password(&self, id: &str, password_hash: String) -> UserResult<()> {
        self.update_user(
            id,
            UserUpdate {
                password: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }

    async fn update_last_login(&self, id: &str) -> UserResult<()> {
        self.update_user(
            id,
            UserUpdate {
                last_login: Some(bson::DateTime::now()),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

fn not_found(id: &str) -> UserError {
    UserError::UserNotFound(format!("User {} not found", id))
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(collection: Collection<User>) -> Self {
        Self { collection }
    }

    fn set_document(update: UserUpdate) -> UserResult<Document> {
        let mut set = doc! { "updated_at": bson::DateTime::now() };
        if let Some(email) = update.email {
            set.insert("email", email);
        }
        if let Some(password) = update.password {
            set.insert("password", password);
        }
        if let Some(is_active) = update.is_active {
            set.insert("is_active", is_active);
        }
        if let Some(roles) = update.roles {
            let roles = bson::to_bson(&roles).map_err(|e| UserError::Update(e.to_string()))?;
            set.insert("roles", roles);
        }
        if let Some(last_login) = update.last_login {
            set.insert("last_login", last_login);
        }
        Ok(set)
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create_user(&self, mut user: User) -> UserResult<User> {
        let result = self.collection.insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                UserError::UserExists(format!("User with email {} already exists", user.email))
            } else {
                UserError::from(e)
            }
        })?;

        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        Ok(self.collection.find_one(doc! { "_id": oid }).await?)
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> UserResult<User> {
        let oid = ObjectId::parse_str(id).map_err(|_| not_found(id))?;
        let set = Self::set_document(update)?;

        self.collection
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    UserError::UserExists("Email is already in use".to_string())
                } else {
                    UserError::Update(e.to_string())
                }
            })?
            .ok_or_else(|| not_found(id))
    }

    async fn delete_user(&self, id: &str) -> UserResult<()> {
        let oid = ObjectId::parse_str(id).map_err(|_| not_found(id))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| UserError::Delete(e.to_string()))?;

        if result.deleted_count == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn list_users(&self, skip: u64, limit: i64) -> UserResult<Vec<User>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_users(&self) -> UserResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
