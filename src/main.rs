pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod tasks;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shadow_todo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting shadow-todo v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    api::server::start_server(config).await
}
