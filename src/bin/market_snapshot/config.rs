//! Configuration of the snapshot tool.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): node and database
//! - CLI arguments: market, user and list caps

use std::path::PathBuf;

use clap::Parser;
use dex_market::{SnapshotLimits, types::SnapshotRequest};

/// Default size of the database connection pool.
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;

/// Environment configuration (connection details).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// RPC URL of the node used to resolve token decimals
    pub node_rpc_url: String,

    /// PostgreSQL connection string of the indexer database
    pub database_url: String,

    /// Optional JSON token list seeding the decimals cache (default: bundled list)
    pub token_list: Option<PathBuf>,

    /// Optional size of the connection pool (default: 5)
    pub max_db_connections: Option<u32>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn max_db_connections(&self) -> u32 {
        self.max_db_connections.unwrap_or(DEFAULT_MAX_DB_CONNECTIONS)
    }
}

/// CLI arguments of a single snapshot.
#[derive(Debug, Parser)]
#[command(name = "market-snapshot")]
#[command(about = "Print a DEX market snapshot as JSON")]
pub struct CliConfig {
    /// Token of the token/native market
    #[arg(long)]
    pub token: String,

    /// User to personalize the snapshot for (own trades and funds)
    #[arg(long)]
    pub user: Option<String>,

    /// Maximum number of trades in each trade list
    #[arg(long, default_value_t = dex_market::store::TRADES_LIMIT)]
    pub trades_limit: usize,

    /// Maximum number of user transfers
    #[arg(long, default_value_t = dex_market::store::TRANSFERS_LIMIT)]
    pub transfers_limit: usize,

    /// Maximum number of orders on each book side
    #[arg(long, default_value_t = dex_market::store::ORDERS_LIMIT)]
    pub orders_limit: usize,
}

impl CliConfig {
    pub fn request(&self) -> SnapshotRequest {
        SnapshotRequest::new(self.token.clone(), self.user.clone())
    }

    pub fn limits(&self) -> Result<SnapshotLimits, ConfigError> {
        for (name, limit) in [
            ("trades_limit", self.trades_limit),
            ("transfers_limit", self.transfers_limit),
            ("orders_limit", self.orders_limit),
        ] {
            if limit == 0 {
                return Err(ConfigError::ZeroLimit(name));
            }
        }
        Ok(SnapshotLimits {
            trades: self.trades_limit,
            transfers: self.transfers_limit,
            orders: self.orders_limit,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} cannot be zero")]
    ZeroLimit(&'static str),
}
