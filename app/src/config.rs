//! Environment-driven configuration.
//!
//! The signing secret has no default and no fallback: a process that
//! cannot find `TODO_SIGNING_SECRET` must not start, because issuing
//! tokens with an ad-hoc secret would silently invalidate every
//! outstanding session on the next restart.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

const ENV_SIGNING_SECRET: &str = "TODO_SIGNING_SECRET";
const ENV_DATABASE_PATH: &str = "TODO_DATABASE_PATH";
const ENV_PORT: &str = "TODO_PORT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Runtime configuration, read once at startup.
#[derive(Debug)]
pub struct AppConfig {
    pub signing_secret: String,
    pub database_path: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let signing_secret = env::var(ENV_SIGNING_SECRET)
            .map_err(|_| ConfigError::MissingVar(ENV_SIGNING_SECRET))?;
        if signing_secret.is_empty() {
            return Err(ConfigError::MissingVar(ENV_SIGNING_SECRET));
        }

        let database_path = env::var(ENV_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/todo.db"));

        let port = match env::var(ENV_PORT) {
            Err(_) => 8080,
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
                name: ENV_PORT,
                value: raw,
            })?,
        };

        Ok(Self {
            signing_secret,
            database_path,
            port,
        })
    }
}
