//! DEX market snapshots.
//!
//! # Overview
//!
//! Read side of a token/native exchange: trades, open orders and user funds
//! indexed into a database are turned into a client-facing
//! [`types::MarketSnapshot`] with human-readable amounts and prices.
//!
//! Use [`token::TokenRegistry`] to resolve ERC20 decimals (cached for the
//! process lifetime), [`store::PgMarketStore`] to query the indexed data and
//! [`snapshot::SnapshotAssembler`] to put them together:
//!
//! ```no_run
//! # async fn run(pool: sqlx::PgPool, url: url::Url) -> dex_market::error::Result<()> {
//! use std::sync::Arc;
//!
//! use alloy::providers::ProviderBuilder;
//! use dex_market::{
//!     chain::RpcChain, snapshot::SnapshotAssembler, store::PgMarketStore,
//!     token::TokenRegistry, types::SnapshotRequest,
//! };
//!
//! let chain = RpcChain::new(ProviderBuilder::new().connect_http(url));
//! let registry = Arc::new(TokenRegistry::bundled(chain)?);
//! let assembler = SnapshotAssembler::new(registry, PgMarketStore::new(pool));
//!
//! let request = SnapshotRequest::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", None);
//! let snapshot = assembler.assemble(&request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations/follow-ups
//!
//! * Snapshots are assembled on request only, there is no push of updates.
//!
//! * Decimals are resolved with a single `eth_call` attempt; retries are left
//!   to the transport (e.g. `RetryBackoffLayer`).
//!
//! # Testing
//!
//! [`testing`] module provides an in-memory store and a scripted chain.

pub mod abi;
pub mod chain;
pub mod error;
pub mod format;
pub mod num;
pub mod snapshot;
pub mod store;
pub mod testing;
pub mod token;
pub mod types;

pub use snapshot::{SnapshotAssembler, SnapshotLimits};
pub use token::TokenRegistry;
