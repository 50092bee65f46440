use crate::config::Settings;
use mongodb::{bson::doc, options::IndexOptions, Client, Collection, IndexModel};
use std::time::Duration;

pub mod memory;
pub mod models;
pub mod users;

pub use memory::InMemoryUserRepository;
pub use users::{MongoUserRepository, UserRepository};

const MAX_CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Errors raised by the user repository and user service
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    UserExists(String),
    #[error("{0}")]
    UserNotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to update user: {0}")]
    Update(String),
    #[error("Failed to delete user: {0}")]
    Delete(String),
    #[error("Database error: {0}")]
    Repository(String),
}

impl From<mongodb::error::Error> for UserError {
    fn from(e: mongodb::error::Error) -> Self {
        UserError::Repository(e.to_string())
    }
}

pub type UserResult<T> = Result<T, UserError>;

/// Connect to MongoDB, retrying the initial ping with exponential backoff,
/// and make sure the users collection has a unique email index.
pub async fn connect_users_collection(
    settings: &Settings,
) -> UserResult<Collection<models::User>> {
    let mut delay = INITIAL_RETRY_DELAY;

    for attempt in 1..=MAX_CONNECT_ATTEMPTS {
        tracing::info!(
            "MongoDB connection attempt {} of {}",
            attempt,
            MAX_CONNECT_ATTEMPTS
        );

        match try_connect_once(settings).await {
            Ok(collection) => {
                tracing::info!("Connected to MongoDB database {}", settings.database_name);
                return Ok(collection);
            }
            Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                tracing::warn!(
                    "MongoDB connection attempt {} failed: {}. Retrying in {}s",
                    attempt,
                    e,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to MongoDB after {} attempts: {}",
                    MAX_CONNECT_ATTEMPTS,
                    e
                );
                return Err(e);
            }
        }
    }

    Err(UserError::Repository(
        "MongoDB connection was never attempted".to_string(),
    ))
}

async fn try_connect_once(settings: &Settings) -> UserResult<Collection<models::User>> {
    let client = Client::with_uri_str(&settings.mongo_url).await?;
    let database = client.database(&settings.database_name);
    database.run_command(doc! { "ping": 1 }).await?;

    let collection = database.collection::<models::User>(&settings.users_collection);
    let index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    collection.create_index(index).await?;

    Ok(collection)
}
