//! Error types for the snapshot tool.

use dex_market::error::SnapshotError;

use crate::config::ConfigError;

/// Main error type for the snapshot tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token list error: {0}")]
    TokenList(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Output encoding error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
