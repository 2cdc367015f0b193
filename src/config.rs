use std::path::PathBuf;

use crate::error::AppError;

/// Key used when `ENCRYPTION_KEY` is not set. Only suitable for local development.
const DEV_ENCRYPTION_KEY: [u8; 32] = *b"shadow-todo-development-key-0001";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub encryption_key: [u8; 32],
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let encryption_key = match std::env::var("ENCRYPTION_KEY") {
            Ok(hex_key) => parse_key(&hex_key)?,
            Err(_) => {
                tracing::warn!("ENCRYPTION_KEY not set, using the development key");
                DEV_ENCRYPTION_KEY
            }
        };

        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid PORT: {}", e)))?,
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            encryption_key,
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SESSION_TTL_HOURS: {}", e)))?,
            cookie_secure: std::env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid COOKIE_SECURE: {}", e)))?,
        })
    }

    /// Configuration rooted at `data_dir` with every other value at its default.
    #[cfg(test)]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: data_dir.into(),
            encryption_key: DEV_ENCRYPTION_KEY,
            session_ttl_hours: 24,
            cookie_secure: false,
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_key(hex_key: &str) -> Result<[u8; 32], AppError> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| AppError::Config(format!("Invalid ENCRYPTION_KEY hex: {}", e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        AppError::Config(format!(
            "ENCRYPTION_KEY must be 64 hex chars (32 bytes), got {} bytes",
            bytes.len()
        ))
    })
}
