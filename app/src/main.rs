//! Server binary: wire configuration, storage, services and the HTTP
//! surface together and run until interrupted.

mod config;
mod logging;

use std::sync::Arc;

use tracing::info;

use api::{AppState, ApiConfig};
use authn::TokenAuthority;
use service::{IdentityService, TaskService};
use storage::{Database, DatabaseConfig, SqliteAccountStore, SqliteTaskStore};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real deployments set the environment
    // directly.
    let _ = dotenvy::dotenv();

    logging::init_logging();

    let config = AppConfig::from_env()?;

    let db = Arc::new(
        Database::new(DatabaseConfig {
            database_path: config.database_path.clone(),
            max_connections: 5,
        })
        .await?,
    );

    let accounts = Arc::new(SqliteAccountStore::new(db.pool().clone()));
    let tasks = Arc::new(SqliteTaskStore::new(db.pool().clone()));
    let tokens = Arc::new(TokenAuthority::new(config.signing_secret.as_bytes()));

    let state = AppState {
        db,
        identity: Arc::new(IdentityService::new(accounts, tokens.clone())),
        tasks: Arc::new(TaskService::new(tasks)),
        tokens,
    };

    info!("starting server on port {}", config.port);
    api::start_server_with_config(state, ApiConfig::new().with_port(config.port)).await
}
