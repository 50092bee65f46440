// Application settings loaded from the environment (and an optional .env file)

use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRES_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("Failed to read env file: {0}")]
    EnvFile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Sentence-transformer weights run in-process with candle
    Local,
    /// Any server exposing an OpenAI-compatible `/embeddings` endpoint
    OpenAI,
}

impl FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(EmbeddingProvider::Local),
            "openai" | "openai_compatible" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MongoDB for users, Qdrant for vectors
    External,
    /// Process-local stores, nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "external" => Ok(StorageBackend::External),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub documents_collection: String,
    pub vector_size: usize,

    pub mongo_url: String,
    pub database_name: String,
    pub users_collection: String,

    pub embedding_provider: EmbeddingProvider,
    pub embedding_model: String,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_batch_size: usize,

    pub chunk_size: usize,
    pub overlap: usize,

    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_expires_minutes: i64,
    pub bcrypt_cost: u32,

    pub max_upload_bytes: usize,
    pub storage_backend: StorageBackend,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from a specific env file. Variables already set in the
    /// process environment take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let iter =
            dotenv::from_path_iter(path.as_ref()).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::EnvFile(e.to_string()))?;
            values.insert(key, value);
        }

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| values.get(key).cloned()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(value) => match Algorithm::from_str(value.trim()) {
                Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_ALGORITHM",
                        value,
                    })
                }
            },
            None => Algorithm::HS256,
        };

        let embedding_provider = match get("EMBEDDING_PROVIDER") {
            Some(value) => EmbeddingProvider::from_str(&value).map_err(|_| ConfigError::Invalid {
                name: "EMBEDDING_PROVIDER",
                value,
            })?,
            None => EmbeddingProvider::Local,
        };

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => StorageBackend::from_str(&value).map_err(|_| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value,
            })?,
            None => StorageBackend::External,
        };

        let settings = Settings {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8000)?,
            qdrant_url: get("QDRANT_URL")
                .unwrap_or_else(|| "http://localhost:6333".to_string())
                .trim_end_matches('/')
                .to_string(),
            qdrant_api_key: get("QDRANT_API_KEY"),
            documents_collection: get("DOCUMENTS_COLLECTION")
                .unwrap_or_else(|| "documents".to_string()),
            vector_size: parse_or(&get, "VECTOR_SIZE", 384)?,
            mongo_url: get("MONGO_URL").unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database_name: get("DATABASE_NAME").unwrap_or_else(|| "rag".to_string()),
            users_collection: get("USERS_COLLECTION").unwrap_or_else(|| "users".to_string()),
            embedding_provider,
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "sentence-transformers/all-MiniLM-L6-v2".to_string()),
            embedding_api_url: get("EMBEDDING_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            embedding_api_key: get("EMBEDDING_API_KEY"),
            embedding_batch_size: parse_or(&get, "EMBEDDING_BATCH_SIZE", 15)?,
            chunk_size: parse_or(&get, "CHUNK_SIZE", 200)?,
            overlap: parse_or(&get, "OVERLAP", 50)?,
            jwt_secret,
            jwt_algorithm,
            jwt_expires_minutes: parse_or(&get, "JWT_EXPIRES_MINUTES", 60)?,
            bcrypt_cost: parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            storage_backend,
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, value: String| Err(ConfigError::Invalid { name, value });

        if self.chunk_size == 0 {
            return invalid("CHUNK_SIZE", self.chunk_size.to_string());
        }
        if self.overlap >= self.chunk_size {
            return invalid(
                "OVERLAP",
                format!("{} (must be smaller than CHUNK_SIZE {})", self.overlap, self.chunk_size),
            );
        }
        if self.vector_size == 0 {
            return invalid("VECTOR_SIZE", self.vector_size.to_string());
        }
        if self.embedding_batch_size == 0 {
            return invalid("EMBEDDING_BATCH_SIZE", self.embedding_batch_size.to_string());
        }
        if !(1..=MAX_JWT_EXPIRES_MINUTES).contains(&self.jwt_expires_minutes) {
            return invalid("JWT_EXPIRES_MINUTES", self.jwt_expires_minutes.to_string());
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return invalid("BCRYPT_COST", self.bcrypt_cost.to_string());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_secret() {
        let settings = Settings::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(settings.port, 8000);
        assert_eq!(settings.vector_size, 384);
        assert_eq!(settings.embedding_batch_size, 15);
        assert_eq!(settings.jwt_algorithm, Algorithm::HS256);
        assert_eq!(settings.embedding_provider, EmbeddingProvider::Local);
        assert_eq!(settings.storage_backend, StorageBackend::External);
        assert_eq!(settings.documents_collection, "documents");
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let err = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("CHUNK_SIZE", "10"),
            ("OVERLAP", "10"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "OVERLAP", .. }));
    }

    #[test]
    fn test_invalid_numbers_and_enums() {
        let err =
            Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("JWT_ALGORITHM", "RS256")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_ALGORITHM", .. }));

        let err = Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("STORAGE_BACKEND", "disk")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORAGE_BACKEND", .. }));
    }

    #[test]
    fn test_token_lifetime_is_bounded() {
        for value in ["0", "-5", "9223372036854775807"] {
            let err = Settings::from_lookup(lookup(&[
                ("JWT_SECRET", "x"),
                ("JWT_EXPIRES_MINUTES", value),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: "JWT_EXPIRES_MINUTES", .. }));
        }

        let settings = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("JWT_EXPIRES_MINUTES", "525600"),
        ]))
        .unwrap();
        assert_eq!(settings.jwt_expires_minutes, MAX_JWT_EXPIRES_MINUTES);
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let settings = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("QDRANT_URL", "http://qdrant:6333/"),
            ("EMBEDDING_PROVIDER", "openai"),
            ("EMBEDDING_API_URL", "http://embed:8080/v1/"),
        ]))
        .unwrap();
        assert_eq!(settings.qdrant_url, "http://qdrant:6333");
        assert_eq!(settings.embedding_api_url, "http://embed:8080/v1");
        assert_eq!(settings.embedding_provider, EmbeddingProvider::OpenAI);
    }

    #[test]
    fn test_env_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "DOCRAG_TEST_UNUSED=1").unwrap();
        writeln!(file, "JWT_SECRET=from-file").unwrap();
        writeln!(file, "DOCUMENTS_COLLECTION=file_docs").unwrap();
        writeln!(file, "CHUNK_SIZE=64").unwrap();
        writeln!(file, "OVERLAP=8").unwrap();
        drop(file);

        let settings = Settings::from_env_file(&path).unwrap();
        assert_eq!(settings.chunk_size, 64);
        assert_eq!(settings.overlap, 8);
        if std::env::var("DOCUMENTS_COLLECTION").is_err() {
            assert_eq!(settings.documents_collection, "file_docs");
        }
    }
}
