//! Market snapshot tool.
//!
//! This binary assembles a single market snapshot from the indexer database
//! and prints it to stdout as JSON.

mod config;
mod error;

use std::{fs::File, io::BufReader, process::exit, sync::Arc};

use alloy::{
    providers::ProviderBuilder, rpc::client::RpcClient, transports::layers::RetryBackoffLayer,
};
use clap::Parser;
use dex_market::{SnapshotAssembler, TokenRegistry, chain::RpcChain, store::PgMarketStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use url::Url;

use config::{CliConfig, EnvConfig};
use error::Result;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(env_config, cli_config).await {
        error!(%e, "Failed to assemble market snapshot");
        exit(1);
    }
}

async fn run(env_config: EnvConfig, cli_config: CliConfig) -> Result<()> {
    let limits = cli_config.limits()?;
    let node_url = Url::parse(&env_config.node_rpc_url)?;

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .http(node_url);
    let chain = RpcChain::new(ProviderBuilder::new().connect_client(client));

    let registry = match &env_config.token_list {
        Some(path) => {
            info!(path = %path.display(), "Loading token list");
            TokenRegistry::from_token_list(chain, BufReader::new(File::open(path)?))?
        }
        None => TokenRegistry::bundled(chain)?,
    };
    info!(tokens = registry.len(), "Token decimals cache seeded");

    let pool = PgPoolOptions::new()
        .max_connections(env_config.max_db_connections())
        .connect(&env_config.database_url)
        .await?;

    let assembler = SnapshotAssembler::new(Arc::new(registry), PgMarketStore::new(pool))
        .with_limits(limits);
    let snapshot = assembler.assemble(&cli_config.request()).await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
