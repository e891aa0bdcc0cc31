//! Configuration for hikehub-social

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SocialError;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hikehub-social")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database and config file
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Maximum pooled SQLite connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long a writer waits for the SQLite lock before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Header carrying the authenticated caller's user id
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Maximum review body length in characters
    #[serde(default = "default_max_review_body_chars")]
    pub max_review_body_chars: usize,

    /// Activity feed size when the caller gives no limit
    #[serde(default = "default_activity_limit")]
    pub activity_default_limit: i64,

    /// Hard cap on the activity feed size
    #[serde(default = "default_activity_max_limit")]
    pub activity_max_limit: i64,
}

fn default_http_port() -> u16 {
    8091
}

fn default_pool_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

fn default_max_review_body_chars() -> usize {
    2000
}

fn default_activity_limit() -> i64 {
    20
}

fn default_activity_max_limit() -> i64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            http_port: default_http_port(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            identity_header: default_identity_header(),
            max_review_body_chars: default_max_review_body_chars(),
            activity_default_limit: default_activity_limit(),
            activity_max_limit: default_activity_max_limit(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SocialError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| SocialError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SocialError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SocialError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the services cannot honour
    pub fn validate(&self) -> Result<(), SocialError> {
        if self.pool_size == 0 {
            return Err(SocialError::Config("pool_size must be at least 1".into()));
        }
        if self.activity_default_limit < 1 || self.activity_max_limit < 1 {
            return Err(SocialError::Config("activity limits must be positive".into()));
        }
        if self.activity_default_limit > self.activity_max_limit {
            return Err(SocialError::Config(
                "activity_default_limit exceeds activity_max_limit".into(),
            ));
        }
        if self.identity_header.trim().is_empty() {
            return Err(SocialError::Config("identity_header must not be empty".into()));
        }
        Ok(())
    }

    /// Get SQLite database path
    pub fn database_path(&self) -> PathBuf {
        self.storage_dir.join(crate::db::DB_FILE_NAME)
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("http_port = 9000\npool_size = 2\n").unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.activity_default_limit, 20);
        assert_eq!(config.activity_max_limit, 100);
        assert_eq!(config.identity_header, "x-user-id");
    }

    #[test]
    fn test_validate_rejects_inverted_limits() {
        let config = Config {
            activity_default_limit: 50,
            activity_max_limit: 10,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            storage_dir: dir.path().to_path_buf(),
            http_port: 1234,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.http_port, 1234);
        assert_eq!(loaded.storage_dir, dir.path());
    }

    #[test]
    fn test_database_path_matches_opened_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        crate::db::SocialDb::open(&config.storage_dir, 1, 1000).unwrap();
        assert!(config.database_path().is_file());
        assert_eq!(config.database_path().parent(), Some(dir.path()));
    }
}
