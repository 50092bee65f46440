use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// User document as stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    pub created_at: bson::DateTime,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
    #[serde(default)]
    pub last_login: Option<bson::DateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: None,
            email,
            password: password_hash,
            created_at: bson::DateTime::now(),
            updated_at: None,
            last_login: None,
            is_active: true,
            roles: Vec::new(),
        }
    }

    pub fn id_string(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

pub fn to_chrono(dt: bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub roles: Option<Vec<String>>,
    pub last_login: Option<bson::DateTime>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.is_active.is_none()
            && self.roles.is_none()
            && self.last_login.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(roles) = self.roles {
            user.roles = roles;
        }
        if let Some(last_login) = self.last_login {
            user.last_login = Some(last_login);
        }
        user.updated_at = Some(bson::DateTime::now());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_string(),
            email: user.email.clone(),
            created_at: to_chrono(user.created_at),
            updated_at: user.updated_at.and_then(to_chrono),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserResponse,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDetail {
    fn from(user: User) -> Self {
        Self {
            user: UserResponse::from(&user),
            is_active: user.is_active,
            roles: user.roles,
            last_login: user.last_login.and_then(to_chrono),
        }
    }
}

// Request/Response models for API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_never_contains_password() {
        let mut user = User::new("a@b.co".to_string(), "$2b$04$hash".to_string());
        user.id = Some(ObjectId::new());
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.co");
        assert_eq!(json["id"].as_str().unwrap().len(), 24);
    }

    #[test]
    fn test_update_sets_updated_at() {
        let mut user = User::new("a@b.co".to_string(), "old".to_string());
        assert!(user.updated_at.is_none());
        UserUpdate {
            password: Some("new".to_string()),
            ..Default::default()
        }
        .apply(&mut user);
        assert_eq!(user.password, "new");
        assert!(user.updated_at.is_some());
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let doc = bson::doc! {
            "email": "a@b.co",
            "password": "hash",
            "created_at": bson::DateTime::now(),
        };
        let user: User = bson::from_document(doc).unwrap();
        assert!(user.is_active);
        assert!(user.roles.is_empty());
        assert!(user.id.is_none());
    }
}
